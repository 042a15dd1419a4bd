// src/error.rs

use std::fmt;

/// Crate-wide error enum.
/// Item-level validation never travels through here; it lands in the item's error slots.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    // Local guard failed before anything left the process
    Validation(String),

    // Remote store rejected or failed the call
    Persistence(String),

    // Learner id unresolved, or the assessment is not loaded / not published
    PrerequisiteMissing(String),

    // Caller supplied an index or id that does not exist
    NotFound(String),

    // Already submitted, already assigned
    Conflict(String),

    // Draft storage or serialization failure
    Internal(String),
}

impl AppError {
    /// Message suitable for a session-level notice.
    pub fn message(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::Persistence(msg)
            | AppError::PrerequisiteMissing(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Converts `sqlx::Error` into `AppError::Internal`.
/// Only the draft store talks to a database.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
