use pdrop_crypto::CryptoError;
use pdrop_storage::StorageError;
use thiserror::Error;

pub type TransferResult<T> = Result<T, TransferError>;

/// Terminal failures of an upload or download. Nothing is retried here.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("no files to upload")]
    EmptyInput,

    #[error("invalid passphrase: {0}")]
    InvalidPassphrase(#[source] CryptoError),

    #[error("nothing stored for this passphrase")]
    NotFound,

    #[error("decryption failed: {0}")]
    DecryptionFailed(#[source] CryptoError),

    #[error("encryption failed: {0}")]
    EncryptionFailed(#[source] CryptoError),

    #[error("storage write failed: {0}")]
    StorageWriteFailed(String),

    #[error("storage read failed: {0}")]
    StorageReadFailed(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(#[source] CryptoError),
}

impl TransferError {
    /// True for failures a user cannot tell apart from a mistyped passphrase.
    pub fn is_wrong_passphrase(&self) -> bool {
        matches!(self, Self::NotFound | Self::DecryptionFailed(_))
    }
}

impl From<StorageError> for TransferError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => Self::NotFound,
            StorageError::Write(msg) => Self::StorageWriteFailed(msg),
            StorageError::Read(msg) => Self::StorageReadFailed(msg),
        }
    }
}
