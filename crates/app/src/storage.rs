//! Storage errors
//!
//! Repositories return `sqlx::Error`; services fold it into [`StoreError`] so callers can
//! tell a missing record from a clash or an outage without depending on `sqlx`.

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;
use tiffin::basket::SnapshotError;
use tracing::error;

/// Errors raised by repositories.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The database could not be reached or the query failed.
    #[error("storage is unavailable")]
    Unavailable,

    /// A record with the same key already exists.
    #[error("record already exists")]
    AlreadyExists,

    /// No record has the key.
    #[error("record not found")]
    NotFound,

    /// The value could not be encoded for storage.
    #[error("record could not be encoded")]
    Malformed,
}

impl From<SnapshotError> for StoreError {
    fn from(source: SnapshotError) -> Self {
        error!(error = %source, "failed to encode basket snapshot");

        Self::Malformed
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(source: sqlx::Error) -> Self {
        if matches!(source, sqlx::Error::RowNotFound) {
            return Self::NotFound;
        }

        match source.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            _ => {
                error!(error = %source, "database error");

                Self::Unavailable
            }
        }
    }
}
