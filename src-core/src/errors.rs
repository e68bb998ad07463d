use diesel::result::Error as DieselError;
use thiserror::Error;

use crate::dividends::DividendError;
use crate::holdings::HoldingError;
use crate::offerings::OfferingError;
use crate::payments::PaymentError;
use crate::transactions::TransactionError;
use crate::users::UserError;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the trading backend
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("User error: {0}")]
    User(#[from] UserError),

    #[error("Offering error: {0}")]
    Offering(#[from] OfferingError),

    #[error("Holding error: {0}")]
    Holding(#[from] HoldingError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Dividend error: {0}")]
    Dividend(#[from] DividendError),
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(#[from] diesel::result::ConnectionError),

    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(#[from] r2d2::Error),

    #[error("Database query failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),
}

impl From<DieselError> for Error {
    fn from(err: DieselError) -> Self {
        Error::Database(DatabaseError::QueryFailed(err))
    }
}

impl From<r2d2::Error> for Error {
    fn from(e: r2d2::Error) -> Self {
        Error::Database(DatabaseError::PoolCreationFailed(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}
