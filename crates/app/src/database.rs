//! Database connection management

use std::error::Error as StdError;

use async_trait::async_trait;
use mockall::automock;
use rusty_money::{Money, iso::Currency};
use sqlx::{
    PgPool, Postgres, Row, Transaction, migrate::MigrateError, postgres::PgRow, query_scalar,
};
use tiffin::{catalog::ItemId, pricing::{self, Price}};

use crate::storage::StoreError;

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Begin a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error when no connection could be acquired.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Apply any migrations the database has not seen yet.
///
/// # Errors
///
/// Returns an error if a migration fails or the applied history does not match.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// Reports whether the database is answering queries.
#[automock]
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl HealthCheck for Db {
    async fn ping(&self) -> Result<(), StoreError> {
        query_scalar::<Postgres, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(())
    }
}

pub(crate) fn decode_error(
    column: &str,
    source: impl StdError + Send + Sync + 'static,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

pub(crate) fn try_get_currency(row: &PgRow) -> Result<&'static Currency, sqlx::Error> {
    let code: String = row.try_get("currency")?;

    pricing::currency_from_code(&code).map_err(|e| decode_error("currency", e))
}

pub(crate) fn try_get_price(
    row: &PgRow,
    column: &str,
    currency: &'static Currency,
) -> Result<Price, sqlx::Error> {
    let minor: i64 = row.try_get(column)?;

    Ok(Money::from_minor(minor, currency))
}

pub(crate) fn try_get_item_id(row: &PgRow, column: &str) -> Result<Option<ItemId>, sqlx::Error> {
    let id: Option<i64> = row.try_get(column)?;

    id.map(|id| u64::try_from(id).map(ItemId).map_err(|e| decode_error(column, e)))
        .transpose()
}

pub(crate) fn try_i64_from_item_id(id: ItemId) -> Result<i64, sqlx::Error> {
    i64::try_from(id.0).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}
