use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Stream read error: {0}")]
    StreamReadError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(#[from] anyhow::Error),

    #[error("Upload not found: {0}")]
    UploadNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::StreamReadError(err.to_string())
    }
}
