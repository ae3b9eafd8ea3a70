//! Checkout service errors.

use thiserror::Error;
use tiffin::{checkout::CheckoutError, promotions::InvalidPromo};

use crate::{
    domain::promotions::RedemptionError, rate_limit::RateLimited, storage::StoreError,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckoutServiceError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The promo was used up between validation and redemption; it has been removed.
    #[error("promo code {code} was removed: {reason}")]
    PromoRejected { code: String, reason: InvalidPromo },

    #[error(transparent)]
    RateLimited(#[from] RateLimited),

    #[error("checkout temporarily unavailable")]
    Unavailable(#[source] StoreError),
}

impl From<StoreError> for CheckoutServiceError {
    fn from(error: StoreError) -> Self {
        Self::Unavailable(error)
    }
}

impl From<sqlx::Error> for CheckoutServiceError {
    fn from(error: sqlx::Error) -> Self {
        Self::Unavailable(error.into())
    }
}

impl CheckoutServiceError {
    pub(crate) fn from_redemption(code: &str, error: RedemptionError) -> Self {
        match error {
            RedemptionError::Rejected(reason) => Self::PromoRejected {
                code: code.to_string(),
                reason,
            },
            RedemptionError::Store(error) => Self::Unavailable(error),
        }
    }
}
