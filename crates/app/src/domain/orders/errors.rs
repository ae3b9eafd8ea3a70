//! Orders service errors.

use thiserror::Error;

use crate::storage::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("orders are temporarily unavailable")]
    Unavailable,
}

impl From<StoreError> for OrdersServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound,
            StoreError::Unavailable | StoreError::AlreadyExists | StoreError::Malformed => {
                Self::Unavailable
            }
        }
    }
}

impl From<sqlx::Error> for OrdersServiceError {
    fn from(error: sqlx::Error) -> Self {
        StoreError::from(error).into()
    }
}
