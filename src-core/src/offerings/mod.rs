// Module declarations
pub(crate) mod offerings_errors;
pub(crate) mod offerings_model;
pub(crate) mod offerings_repository;
pub(crate) mod offerings_service;
pub(crate) mod offerings_traits;

// Re-export the public interface
pub use offerings_model::{NewOffering, Offering, OfferingDB, OfferingUpdate};
pub use offerings_repository::OfferingRepository;
pub use offerings_service::OfferingService;
pub use offerings_traits::OfferingServiceTrait;

// Re-export error types for convenience
pub use offerings_errors::{OfferingError, Result};
