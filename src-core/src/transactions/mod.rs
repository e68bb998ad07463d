// Module declarations
pub(crate) mod settlement;
pub(crate) mod transactions_errors;
pub(crate) mod transactions_model;
pub(crate) mod transactions_repository;
pub(crate) mod transactions_service;
pub(crate) mod transactions_traits;

// Re-export the public interface
pub use settlement::{settle, SettlementOutcome};
pub use transactions_model::{
    NewTransaction, Transaction, TransactionDB, TransactionSide, TransactionStatus,
};
pub use transactions_repository::TransactionRepository;
pub use transactions_service::TransactionService;
pub use transactions_traits::TransactionServiceTrait;

// Re-export error types for convenience
pub use transactions_errors::{Result, TransactionError};
