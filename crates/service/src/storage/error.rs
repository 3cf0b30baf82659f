use thiserror::Error;

/// Failures surfaced by a [`DocumentStore`](super::DocumentStore).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("document store unavailable: {0}")]
    BackendUnavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("document store error ({status}): {message}")]
    Store { status: u16, message: String },
    #[error("authentication error: {0}")]
    Auth(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("no integer id left to assign in {0}")]
    IdSpaceExhausted(String),
}

impl StorageError {
    pub fn not_found(collection: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{collection}/{id}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
