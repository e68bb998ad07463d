// Module declarations
pub(crate) mod dividends_errors;
pub(crate) mod dividends_model;
pub(crate) mod dividends_repository;
pub(crate) mod dividends_service;

// Re-export the public interface
pub use dividends_model::{
    Dividend, DividendDB, DividendPayout, DividendPayoutDB, NewDividend, PayoutStatus,
};
pub use dividends_repository::DividendRepository;
pub use dividends_service::DividendService;

// Re-export error types for convenience
pub use dividends_errors::{DividendError, Result};
