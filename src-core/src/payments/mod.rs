// Module declarations
pub(crate) mod gateway;
pub(crate) mod payments_errors;
pub(crate) mod payments_model;
pub(crate) mod payments_repository;
pub(crate) mod payments_service;

// Re-export the public interface
pub use gateway::{normalize_status, GatewayReceipt, PaymentGateway, WapangajiClient};
pub use payments_model::{
    CallbackPayload, NewPayment, Payment, PaymentDB, PaymentDirection, PaymentStatus,
};
pub use payments_repository::PaymentRepository;
pub use payments_service::{CallbackOutcome, PaymentService};

// Re-export error types for convenience
pub use payments_errors::{PaymentError, Result};
