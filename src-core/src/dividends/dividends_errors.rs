use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for dividend-related operations
#[derive(Debug, Error)]
pub enum DividendError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Payout {0} has already been paid")]
    AlreadyPaid(String),
}

impl From<DieselError> for DividendError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => DividendError::NotFound("Record not found".to_string()),
            _ => DividendError::DatabaseError(err.to_string()),
        }
    }
}

/// Result type for dividend operations
pub type Result<T> = std::result::Result<T, DividendError>;
