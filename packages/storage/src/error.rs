use reqtrack_core::ValidationError;
use thiserror::Error;

/// Storage errors shared by every entity package
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Validation failed: {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl StorageError {
    pub fn not_found(kind: &str, id: &str) -> Self {
        StorageError::NotFound(format!("{} '{}'", kind, id))
    }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        StorageError::Validation(vec![ValidationError::new(field, message)])
    }
}

impl From<Vec<ValidationError>> for StorageError {
    fn from(errors: Vec<ValidationError>) -> Self {
        StorageError::Validation(errors)
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StorageError::not_found("Requirement", "req-1");
        assert_eq!(err.to_string(), "Requirement 'req-1' not found");
    }

    #[test]
    fn test_validation_message_counts_errors() {
        let err = StorageError::from(vec![
            ValidationError::new("title", "title is required"),
            ValidationError::new("category", "category is required"),
        ]);
        assert_eq!(err.to_string(), "Validation failed: 2 error(s)");
    }
}
