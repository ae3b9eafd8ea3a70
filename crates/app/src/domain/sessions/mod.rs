//! Sessions

pub mod baskets;
pub mod models;
mod repository;

pub use baskets::SessionBaskets;
pub use models::{ClientAddress, CustomerUuid, SessionKey, SessionUuid, Visitor};
pub use repository::{MockSessionStore, PgSessionStore, SessionStore};
