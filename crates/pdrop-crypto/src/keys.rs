//! Secret → (encryption key, storage id)
//!
//! Both values are HKDF-SHA256 expansions of the Argon2id root under distinct
//! info strings, so the id can be published as a storage path without
//! revealing anything about the key.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{derive_root_key, KdfParams};
use crate::secret::Secret;
use crate::KEY_SIZE;

const KEY_DOMAIN: &[u8] = b"pdrop-encryption-key";
const ID_DOMAIN: &[u8] = b"pdrop-lookup-id";

/// Symmetric key for file envelopes. Zeroized on drop.
#[derive(Clone)]
pub struct EncryptionKey {
    bytes: [u8; KEY_SIZE],
}

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Opaque storage address: 64 lower-case hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageId(String);

impl StorageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters only, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl std::fmt::Display for StorageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encryption key and storage id for one secret.
#[derive(Debug)]
pub struct DerivedKeys {
    pub key: EncryptionKey,
    pub id: StorageId,
}

/// Derive the encryption key and storage id from a secret.
///
/// Deterministic for a given secret and `params`; nothing else is mixed in.
pub fn derive_keys(secret: &Secret, params: &KdfParams) -> CryptoResult<DerivedKeys> {
    let root = derive_root_key(secret, params)?;

    let key = EncryptionKey::from_bytes(hkdf_derive(root.as_bytes(), KEY_DOMAIN)?);

    let mut id_bytes = hkdf_derive(root.as_bytes(), ID_DOMAIN)?;
    let id = StorageId(hex_encode(&id_bytes));
    id_bytes.zeroize();

    Ok(DerivedKeys { key, id })
}

/// HKDF-SHA256 key derivation with a domain-specific info string.
fn hkdf_derive(ikm: &[u8; KEY_SIZE], info: &[u8]) -> CryptoResult<[u8; KEY_SIZE]> {
    let hkdf = Hkdf::<Sha256>::new(None, ikm);
    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(format!("HKDF expand failed: {e}")))?;
    Ok(okm)
}

fn hex_encode(data: &[u8]) -> String {
    use std::fmt::Write;
    data.iter().fold(String::with_capacity(data.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}
