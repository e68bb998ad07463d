// Module declarations
pub(crate) mod portfolio_model;
pub(crate) mod portfolio_service;

// Re-export the public interface
pub use portfolio_model::{PortfolioPosition, PortfolioSummary};
pub use portfolio_service::PortfolioService;
