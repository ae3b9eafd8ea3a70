//! Accounts
//!
//! Basket carry-over between a customer's sessions.

pub mod errors;
mod repository;
pub mod service;

pub use errors::AccountsServiceError;
pub use repository::{MockProfileStore, PgProfileStore, ProfileStore};
pub use service::*;
