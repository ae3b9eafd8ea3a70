//! Session Store

use async_trait::async_trait;
use mockall::automock;
use serde_json::Value;
use sqlx::{Postgres, query, query_scalar};

use crate::{
    database::Db,
    domain::sessions::models::{SessionKey, SessionUuid},
    storage::StoreError,
};

const GET_SESSION_VALUE_SQL: &str = include_str!("sql/get_session_value.sql");
const SET_SESSION_VALUE_SQL: &str = include_str!("sql/set_session_value.sql");
const DELETE_SESSION_VALUE_SQL: &str = include_str!("sql/delete_session_value.sql");

/// Per-visitor key/value store of JSON values.
#[automock]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Value stored under `key`, if any.
    async fn get(&self, session: SessionUuid, key: SessionKey) -> Result<Option<Value>, StoreError>;

    /// Stores `value` under `key`, replacing what was there.
    async fn set(&self, session: SessionUuid, key: SessionKey, value: Value) -> Result<(), StoreError>;

    /// Removes `key`; removing a missing key is not an error.
    async fn remove(&self, session: SessionUuid, key: SessionKey) -> Result<(), StoreError>;
}

/// Session values kept in the `session_values` table.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    db: Db,
}

impl PgSessionStore {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get(&self, session: SessionUuid, key: SessionKey) -> Result<Option<Value>, StoreError> {
        let mut tx = self.db.begin().await?;

        let value = query_scalar::<Postgres, Value>(GET_SESSION_VALUE_SQL)
            .bind(session.into_uuid())
            .bind(key.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(value)
    }

    async fn set(&self, session: SessionUuid, key: SessionKey, value: Value) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;

        query(SET_SESSION_VALUE_SQL)
            .bind(session.into_uuid())
            .bind(key.as_str())
            .bind(value)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn remove(&self, session: SessionUuid, key: SessionKey) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;

        query(DELETE_SESSION_VALUE_SQL)
            .bind(session.into_uuid())
            .bind(key.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
