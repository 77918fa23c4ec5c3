use thiserror::Error;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failures reported by a mapping store backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage serialization failed: {0}")]
    Serialization(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Returns `true` for transient infrastructure failures.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Errors surfaced by the shortening service to its callers.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("alias already exists: {0}")]
    AliasConflict(String),
    #[error("short code not found: {0}")]
    CodeNotFound(String),
    #[error("no free short code after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        if value.is_unavailable() {
            Self::StorageUnavailable(value.to_string())
        } else {
            Self::Storage(value.to_string())
        }
    }
}
