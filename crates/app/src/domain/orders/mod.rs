//! Orders

pub mod errors;
pub mod models;
mod repository;
pub mod service;

pub use errors::OrdersServiceError;
pub(crate) use repository::PgOrdersRepository;
pub use service::*;
