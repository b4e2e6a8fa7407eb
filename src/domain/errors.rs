//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.

use sea_orm::SqlErr;
use std::fmt;

use super::validation::ValidationErrors;

#[derive(Debug)]
pub enum DomainError {
    /// Resource not found
    NotFound,
    /// One or more field-level validation failures
    Validation(ValidationErrors),
    /// Deletion blocked by dependent records (restrict-delete)
    Protected(String),
    /// Database/persistence error
    Database(String),
    /// Generic internal error
    Internal(String),
}

impl DomainError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        DomainError::Validation(errors)
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NotFound => write!(f, "Resource not found"),
            DomainError::Validation(errors) => write!(f, "Validation error: {}", errors),
            DomainError::Protected(msg) => write!(f, "Operation blocked: {}", msg),
            DomainError::Database(msg) => write!(f, "Database error: {}", msg),
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

// Constraint violations that slip past the repository checks are still
// reported as caller errors rather than as a 500.
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                DomainError::field("__all__", format!("Unique constraint violated: {}", msg))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => DomainError::Protected(msg),
            _ => DomainError::Database(e.to_string()),
        }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        DomainError::Validation(errors)
    }
}
