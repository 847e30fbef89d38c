use thiserror::Error;

pub type PdropResult<T> = Result<T, PdropError>;

#[derive(Debug, Error)]
pub enum PdropError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
