// ABOUTME: Field-level validation errors and helpers
// ABOUTME: Collects problems per field so callers can report all of them at once

use serde::Serialize;
use std::fmt;

/// A single invalid field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accumulator used by the `validate` functions of each package
#[derive(Debug, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.0.extend(errors);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when nothing was collected
    pub fn into_result(self) -> Result<(), Vec<ValidationError>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}

/// Reject missing or whitespace-only values
pub fn require_non_empty(field: &str, value: &str) -> Option<ValidationError> {
    if value.trim().is_empty() {
        Some(ValidationError::new(field, format!("{} is required", field)))
    } else {
        None
    }
}

/// Reject values outside `min..=max`
pub fn check_range(field: &str, value: i64, min: i64, max: i64) -> Option<ValidationError> {
    if value < min || value > max {
        Some(ValidationError::new(
            field,
            format!("{} must be between {} and {}", field, min, max),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("title", "Auth").is_none());
        let err = require_non_empty("title", "   ").unwrap();
        assert_eq!(err, ValidationError::new("title", "title is required"));
    }

    #[test]
    fn test_check_range_bounds() {
        assert!(check_range("priority", 1, 1, 5).is_none());
        assert!(check_range("priority", 5, 1, 5).is_none());
        assert!(check_range("priority", 0, 1, 5).is_some());
        assert!(check_range("priority", 6, 1, 5).is_some());
    }

    #[test]
    fn test_validation_errors_collects() {
        let mut errors = ValidationErrors::new();
        errors.extend(require_non_empty("title", ""));
        errors.extend(require_non_empty("category", "ui"));
        errors.extend(check_range("effort", 0, 1, 10));

        let collected = errors.into_result().unwrap_err();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].field, "title");
        assert_eq!(collected[1].field, "effort");
    }

    #[test]
    fn test_display() {
        let err = ValidationError::new("email", "email is required");
        assert_eq!(err.to_string(), "email: email is required");
    }
}
