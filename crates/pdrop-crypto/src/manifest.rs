//! Drop bundle format
//!
//! A bundle is the single object stored under a drop's storage id:
//! - format version and write time (plaintext)
//! - ordered manifest entries, each holding one envelope (base64)
//!
//! Entry order is the upload order; each envelope is bound to its position
//! and to the number of entries through the AEAD associated data, so entries
//! cannot be reordered, dropped, or added.

use pdrop_core::File;
use serde::{Deserialize, Serialize};

use crate::envelope::{decrypt_file, encrypt_file, FileEnvelope};
use crate::error::{CryptoError, CryptoResult};
use crate::keys::EncryptionKey;

pub const BUNDLE_VERSION: u32 = 1;

/// A single envelope in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Position of the file in the upload (0-based)
    pub index: u64,
    /// Size of the envelope in bytes (includes nonce + tag overhead);
    /// checked against the decoded envelope on open
    pub encrypted_size: u64,
    /// `[nonce][ciphertext + tag]` (base64)
    pub envelope: String,
}

/// Everything stored for one drop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropBundle {
    /// Bundle format version
    pub version: u32,
    /// Unix timestamp when the bundle was sealed
    pub created_at: u64,
    /// Ordered list of envelopes
    pub entries: Vec<ManifestEntry>,
}

impl DropBundle {
    /// Encrypt `files` in order under `key`.
    pub fn seal(key: &EncryptionKey, files: &[File]) -> CryptoResult<Self> {
        let count = files.len() as u64;
        let entries = files
            .iter()
            .enumerate()
            .map(|(i, file)| {
                let envelope = encrypt_file(key, i as u64, count, file)?;
                tracing::debug!(index = i, encrypted_size = envelope.len(), "sealed envelope");
                Ok(ManifestEntry {
                    index: i as u64,
                    encrypted_size: envelope.len() as u64,
                    envelope: base64_encode(&envelope.to_bytes()),
                })
            })
            .collect::<CryptoResult<Vec<_>>>()?;

        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Ok(Self {
            version: BUNDLE_VERSION,
            created_at,
            entries,
        })
    }

    /// Decrypt every entry in manifest order.
    ///
    /// All-or-nothing: an empty bundle, or the first entry that fails to
    /// decode or authenticate, fails the whole bundle with `IntegrityFailure`.
    pub fn open(&self, key: &EncryptionKey) -> CryptoResult<Vec<File>> {
        if self.version != BUNDLE_VERSION {
            return Err(CryptoError::Manifest(format!(
                "unsupported bundle version {}",
                self.version
            )));
        }

        // A sealed bundle always holds at least one file
        if self.entries.is_empty() {
            return Err(CryptoError::IntegrityFailure);
        }

        let count = self.entries.len() as u64;
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                if entry.index != i as u64 {
                    return Err(CryptoError::IntegrityFailure);
                }
                let bytes = base64_decode(&entry.envelope)?;
                if bytes.len() as u64 != entry.encrypted_size {
                    return Err(CryptoError::IntegrityFailure);
                }
                let envelope = FileEnvelope::from_bytes(&bytes)?;
                decrypt_file(key, i as u64, count, &envelope)
            })
            .collect()
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> CryptoResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CryptoError::Manifest(format!("serialization: {e}")))
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(data: &[u8]) -> CryptoResult<Self> {
        serde_json::from_slice(data)
            .map_err(|e| CryptoError::Manifest(format!("deserialization: {e}")))
    }
}

fn base64_encode(data: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.encode(data)
}

fn base64_decode(s: &str) -> CryptoResult<Vec<u8>> {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.decode(s).map_err(|_| CryptoError::IntegrityFailure)
}
