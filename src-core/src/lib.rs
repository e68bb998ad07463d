pub mod db;

pub mod cache;
pub mod dividends;
pub mod errors;
pub mod holdings;
pub mod offerings;
pub mod payments;
pub mod portfolio;
pub mod schema;
pub mod transactions;
pub mod users;
