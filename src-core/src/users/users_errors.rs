use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for user-related operations
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Phone already registered: {0}")]
    PhoneAlreadyRegistered(String),
    #[error("Admin accounts cannot be modified this way")]
    AdminImmutable,
}

impl From<DieselError> for UserError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => UserError::NotFound("Record not found".to_string()),
            _ => UserError::DatabaseError(err.to_string()),
        }
    }
}

/// Result type for user operations
pub type Result<T> = std::result::Result<T, UserError>;
