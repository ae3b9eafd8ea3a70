//! Session Baskets
//!
//! Loads the visitor's basket from its session snapshot and writes it back. A snapshot that
//! cannot be read is logged and replaced by an empty basket; the visitor loses the basket
//! rather than the page.

use std::{fmt, sync::Arc};

use serde_json::Value;
use tiffin::{
    basket::{Basket, BasketSnapshot},
    orders::OrderReference,
    pricing::PricingPolicy,
};
use tracing::warn;

use crate::{
    domain::sessions::{
        models::{SessionKey, SessionUuid},
        repository::SessionStore,
    },
    storage::StoreError,
};

#[derive(Clone)]
pub struct SessionBaskets {
    store: Arc<dyn SessionStore>,
    policy: PricingPolicy,
}

impl SessionBaskets {
    pub fn new(store: Arc<dyn SessionStore>, policy: PricingPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> PricingPolicy {
        self.policy
    }

    /// The session's basket; empty when there is none or it cannot be read.
    pub async fn load(&self, session: SessionUuid) -> Result<Basket, StoreError> {
        let Some(value) = self.store.get(session, SessionKey::Basket).await? else {
            return Ok(Basket::new(self.policy));
        };

        match self.parse(value) {
            Ok(basket) => Ok(basket),
            Err(error) => {
                warn!(%session, %error, "discarding unreadable basket snapshot");

                Ok(Basket::new(self.policy))
            }
        }
    }

    pub async fn save(&self, session: SessionUuid, basket: &Basket) -> Result<(), StoreError> {
        let value = basket.to_snapshot().to_value()?;

        self.store.set(session, SessionKey::Basket, value).await
    }

    pub async fn clear(&self, session: SessionUuid) -> Result<(), StoreError> {
        self.store.remove(session, SessionKey::Basket).await
    }

    /// Reference of the last order placed from the session, if it is still readable.
    pub async fn last_order_reference(
        &self,
        session: SessionUuid,
    ) -> Result<Option<OrderReference>, StoreError> {
        let value = self.store.get(session, SessionKey::LastOrderReference).await?;

        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|reference| reference.parse().ok()))
    }

    pub async fn set_last_order_reference(
        &self,
        session: SessionUuid,
        reference: &OrderReference,
    ) -> Result<(), StoreError> {
        self.store
            .set(
                session,
                SessionKey::LastOrderReference,
                Value::String(reference.to_string()),
            )
            .await
    }

    pub async fn forget_last_order(&self, session: SessionUuid) -> Result<(), StoreError> {
        self.store
            .remove(session, SessionKey::LastOrderReference)
            .await
    }

    /// Rebuilds a basket from a stored snapshot value.
    pub fn parse(&self, value: Value) -> Result<Basket, tiffin::basket::SnapshotError> {
        let snapshot = BasketSnapshot::from_value(value)?;

        Basket::from_snapshot(&snapshot, self.policy)
    }
}

impl fmt::Debug for SessionBaskets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBaskets")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
