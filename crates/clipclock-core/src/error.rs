use thiserror::Error;

/// Application-wide error types for clipclock.
#[derive(Error, Debug)]
pub enum AppError {
    /// Submitted URL is malformed. Never reaches the job store.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// External tool could not be launched (missing binary, permissions).
    #[error("Failed to launch {program}: {message}")]
    SpawnError { program: String, message: String },

    /// Tool ran but produced an unusable result.
    #[error("{0}")]
    ExtractionError(String),

    /// HTTP request failed (fetching a page or API document).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Persistence layer failed or is unreachable.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A background task panicked or was cancelled.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn extraction(message: impl Into<String>) -> Self {
        AppError::ExtractionError(message.into())
    }
}
