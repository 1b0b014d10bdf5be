use runbucket_abstraction::StoreError;
use thiserror::Error;

pub type RetrievalResult<T> = std::result::Result<T, RetrievalError>;

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// A path could not be expressed relative to its bucket root.
    #[error("path error: {path}: {reason}")]
    Path { path: String, reason: String },

    /// A payload did not match the artifact schema.
    #[error("schema error: {0}")]
    Schema(String),

    /// An epoch index could not be parsed from an object name.
    #[error("malformed object name '{name}': {reason}")]
    MalformedName { name: String, reason: String },

    /// Two epoch objects of one run instance share an index.
    #[error("duplicate epoch index {index}: {first} and {second}")]
    DuplicateEpoch { index: u32, first: String, second: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// One or more items of a batch failed; per-item detail lives in the report.
    #[error("{} of {total} downloads failed: {}", .failed.len(), .failed.join(", "))]
    PartialBatchFailure { failed: Vec<String>, total: usize },

    /// A download worker stopped before reporting a result.
    #[error("worker error: {0}")]
    Worker(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RetrievalError {
    pub(crate) fn path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Path { path: path.into(), reason: reason.into() }
    }

    pub(crate) fn malformed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedName { name: name.into(), reason: reason.into() }
    }
}
