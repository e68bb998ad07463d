use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for offering-related operations
#[derive(Debug, Error)]
pub enum OfferingError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Offering {0} is referenced by existing transactions or holdings")]
    InUse(String),
}

impl From<DieselError> for OfferingError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => OfferingError::NotFound("Record not found".to_string()),
            _ => OfferingError::DatabaseError(err.to_string()),
        }
    }
}

/// Result type for offering operations
pub type Result<T> = std::result::Result<T, OfferingError>;
