//! Key derivation: Argon2id secret → root key

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::secret::Secret;
use crate::KEY_SIZE;

/// Fixed public salt. The secret carries 264 bits of entropy, so there is no
/// per-drop salt to store; versioned so the derivation can change later.
const ROOT_SALT: &[u8; 16] = b"pdrop-secret-v1\0";

/// 256-bit intermediate key from which the encryption key and storage id are
/// expanded. Zeroized on drop.
pub struct RootKey {
    bytes: [u8; KEY_SIZE],
}

impl RootKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for RootKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for RootKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Argon2id parameters for KDF
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 16384 = 16 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 2)
    pub time_cost: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // Lighter than a password KDF would need, since the input is high-entropy
        Self {
            mem_cost_kib: 16384,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

/// Stretch the secret into a root key using Argon2id with the fixed salt.
pub fn derive_root_key(secret: &Secret, params: &KdfParams) -> CryptoResult<RootKey> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(format!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(secret.as_bytes(), ROOT_SALT, &mut key)
        .map_err(|e| CryptoError::KeyDerivation(format!("Argon2id KDF failed: {e}")))?;

    Ok(RootKey { bytes: key })
}
