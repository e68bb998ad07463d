use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for transaction-related operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Offering has only {available} shares available, {requested} requested")]
    InsufficientSupply { available: i64, requested: i64 },
    #[error("Holding has only {owned} shares, {requested} requested")]
    InsufficientHoldings { owned: i64, requested: i64 },
    #[error("Transaction {0} has already been processed")]
    AlreadyProcessed(String),
    #[error("Gateway rejected the request: {0}")]
    GatewayRejected(String),
    #[error("Gateway unreachable: {0}")]
    GatewayUnreachable(String),
}

impl From<DieselError> for TransactionError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => TransactionError::NotFound("Record not found".to_string()),
            _ => TransactionError::DatabaseError(err.to_string()),
        }
    }
}

/// Result type for transaction operations
pub type Result<T> = std::result::Result<T, TransactionError>;
