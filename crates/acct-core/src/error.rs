use crate::storage::StorageError;
use crate::validation::FieldErrors;
use thiserror::Error;

/// Accounting core errors.
#[derive(Debug, Error)]
pub enum AcctError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),

    #[error("OTP configuration error: {0}")]
    Otp(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AcctError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Single-field validation failure.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

impl From<StorageError> for AcctError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict(message) => Self::Conflict(message),
            StorageError::NotFound(id) => Self::NotFound {
                kind: "record",
                id,
            },
            other => Self::Storage(other.to_string()),
        }
    }
}
