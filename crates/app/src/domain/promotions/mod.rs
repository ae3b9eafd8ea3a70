//! Promotions

pub mod errors;
mod repository;

pub use errors::RedemptionError;
pub(crate) use repository::PgPromotionsRepository;
