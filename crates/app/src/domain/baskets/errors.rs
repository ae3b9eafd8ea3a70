//! Baskets service errors.

use thiserror::Error;
use tiffin::{basket::BasketError, promotions::InvalidPromo};

use crate::{rate_limit::RateLimited, storage::StoreError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BasketsServiceError {
    #[error("menu item not found")]
    ItemNotFound,

    #[error("order not found")]
    OrderNotFound,

    #[error(transparent)]
    Basket(#[from] BasketError),

    #[error(transparent)]
    InvalidPromo(#[from] InvalidPromo),

    #[error(transparent)]
    RateLimited(#[from] RateLimited),

    #[error("basket temporarily unavailable")]
    Unavailable(#[source] StoreError),
}

impl From<StoreError> for BasketsServiceError {
    fn from(error: StoreError) -> Self {
        Self::Unavailable(error)
    }
}

impl From<sqlx::Error> for BasketsServiceError {
    fn from(error: sqlx::Error) -> Self {
        Self::Unavailable(error.into())
    }
}
