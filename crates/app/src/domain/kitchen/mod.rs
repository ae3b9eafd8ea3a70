//! Kitchen

pub mod errors;
pub mod service;

pub use errors::KitchenServiceError;
pub use service::*;
