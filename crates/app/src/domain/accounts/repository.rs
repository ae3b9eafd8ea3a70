//! Profiles Repository

use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;
use sqlx::{Postgres, query, query_scalar};

use crate::{database::Db, domain::sessions::CustomerUuid, storage::StoreError};

const GET_SAVED_BASKET_SQL: &str = include_str!("sql/get_saved_basket.sql");
const SAVE_BASKET_SQL: &str = include_str!("sql/save_basket.sql");
const DELETE_SAVED_BASKET_SQL: &str = include_str!("sql/delete_saved_basket.sql");

/// Customer profile storage for baskets carried between sessions.
#[automock]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn saved_basket(&self, customer: CustomerUuid) -> Result<Option<Value>, StoreError>;

    async fn save_basket(&self, customer: CustomerUuid, snapshot: Value) -> Result<(), StoreError>;

    async fn clear_saved_basket(&self, customer: CustomerUuid) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct PgProfileStore {
    db: Db,
}

impl PgProfileStore {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn saved_basket(&self, customer: CustomerUuid) -> Result<Option<Value>, StoreError> {
        let mut tx = self.db.begin().await?;

        let snapshot = query_scalar::<Postgres, Value>(GET_SAVED_BASKET_SQL)
            .bind(customer.into_uuid())
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(snapshot)
    }

    async fn save_basket(&self, customer: CustomerUuid, snapshot: Value) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;

        query(SAVE_BASKET_SQL)
            .bind(customer.into_uuid())
            .bind(snapshot)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn clear_saved_basket(&self, customer: CustomerUuid) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;

        query(DELETE_SAVED_BASKET_SQL)
            .bind(customer.into_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
