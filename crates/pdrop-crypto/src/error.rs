use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("passphrase incomplete: {unset} of 24 words missing")]
    Incomplete { unset: usize },

    #[error("passphrase word {slot} is not in the word list")]
    InvalidWord { slot: usize },

    #[error("passphrase has {0} words (expected at most 24)")]
    TooManyWords(usize),

    #[error("passphrase slot {0} out of range")]
    SlotOutOfRange(usize),

    #[error("secret has wrong size: {got} bytes (expected {expected})")]
    InvalidSecretLength { got: usize, expected: usize },

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("integrity check failed: wrong key or corrupted data")]
    IntegrityFailure,

    #[error("manifest error: {0}")]
    Manifest(String),
}
