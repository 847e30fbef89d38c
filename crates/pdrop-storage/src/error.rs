use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("nothing stored at {0}")]
    NotFound(String),

    #[error("storage write failed: {0}")]
    Write(String),

    #[error("storage read failed: {0}")]
    Read(String),
}
