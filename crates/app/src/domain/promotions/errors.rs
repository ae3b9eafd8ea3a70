//! Promotion repository errors.

use thiserror::Error;
use tiffin::promotions::InvalidPromo;

use crate::storage::StoreError;

/// Why a redemption could not be recorded.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RedemptionError {
    /// The rule no longer allows the redemption, e.g. another order took the last use.
    #[error(transparent)]
    Rejected(InvalidPromo),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for RedemptionError {
    fn from(error: sqlx::Error) -> Self {
        Self::Store(error.into())
    }
}
