//! Kitchen service errors.

use thiserror::Error;
use tiffin::orders::TransitionError;

use crate::storage::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KitchenServiceError {
    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("orders are temporarily unavailable")]
    Unavailable(#[source] StoreError),
}

impl From<StoreError> for KitchenServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound,
            StoreError::Unavailable | StoreError::AlreadyExists | StoreError::Malformed => {
                Self::Unavailable(error)
            }
        }
    }
}

impl From<sqlx::Error> for KitchenServiceError {
    fn from(error: sqlx::Error) -> Self {
        StoreError::from(error).into()
    }
}
