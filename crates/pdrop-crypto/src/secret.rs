//! The raw drop secret: 264 random bits, shown to the user as 24 words

use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::SECRET_SIZE;

/// Random secret from which the encryption key and storage id are derived.
///
/// Zeroized on drop. Never persisted; the passphrase is its only durable form.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    bytes: [u8; SECRET_SIZE],
}

impl Secret {
    /// Generate a fresh secret from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; SECRET_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a secret from a slice, rejecting anything but exactly `SECRET_SIZE` bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; SECRET_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidSecretLength {
                    got: bytes.len(),
                    expected: SECRET_SIZE,
                })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_SIZE] {
        &self.bytes
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
