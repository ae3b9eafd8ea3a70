//! Accounts service errors.

use thiserror::Error;

use crate::storage::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountsServiceError {
    #[error("basket temporarily unavailable")]
    Unavailable(#[from] StoreError),
}
