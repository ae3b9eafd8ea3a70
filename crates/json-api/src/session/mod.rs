//! Visitor sessions

mod errors;
mod handlers;
pub(crate) mod middleware;

pub(crate) use handlers::*;
pub(crate) use middleware::{CUSTOMER_HEADER, SESSION_HEADER};
