//! Baskets

pub mod errors;
pub mod models;
pub mod service;

pub use errors::BasketsServiceError;
pub use service::*;
