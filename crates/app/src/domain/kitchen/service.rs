//! Kitchen service.
//!
//! Staff-facing view of active orders and the status actions on them. A status change
//! locks the order row, so two staff members pressing the same button apply it once.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tiffin::orders::{Order, OrderReference, OrderStatus, StatusChange, TransitionError};
use tracing::{info, warn};

use crate::{
    clock::Clock,
    context::Repositories,
    domain::kitchen::errors::KitchenServiceError,
};

#[derive(Clone)]
pub struct PgKitchenService {
    repositories: Repositories,
    clock: Arc<dyn Clock>,
}

impl PgKitchenService {
    pub fn new(repositories: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            repositories,
            clock,
        }
    }

    /// Applies `change` to the locked order and stores the new status.
    async fn update_status(
        &self,
        reference: &OrderReference,
        change: impl FnOnce(&mut Order, Timestamp) -> Result<StatusChange, TransitionError> + Send,
    ) -> Result<StatusChange, KitchenServiceError> {
        let mut tx = self.repositories.db.begin().await?;

        let mut row = self
            .repositories
            .orders
            .lock_order(&mut tx, reference)
            .await?
            .ok_or(KitchenServiceError::NotFound)?;

        let now = self.clock.now();
        let result = change(&mut row.record.order, now)?;

        if result.is_changed() {
            self.repositories
                .orders
                .update_status(&mut tx, row.uuid, result.status(), now)
                .await?;
        }

        tx.commit().await?;

        Ok(result)
    }

    fn report(
        reference: &OrderReference,
        action: &'static str,
        result: &Result<StatusChange, KitchenServiceError>,
    ) {
        match result {
            Ok(StatusChange::Changed { from, to }) => {
                info!(%reference, action, %from, %to, "order status changed");
            }
            Ok(StatusChange::Unchanged(status)) => {
                info!(%reference, action, %status, "order status already up to date");
            }
            Err(error) => {
                warn!(%reference, action, %error, "order status change refused");
            }
        }
    }
}

impl fmt::Debug for PgKitchenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgKitchenService").finish_non_exhaustive()
    }
}

#[async_trait]
impl KitchenService for PgKitchenService {
    async fn active_orders(&self) -> Result<Vec<Order>, KitchenServiceError> {
        let mut tx = self.repositories.db.begin().await?;

        let orders = self.repositories.orders.active_orders(&mut tx).await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn advance(
        &self,
        reference: OrderReference,
        from: OrderStatus,
    ) -> Result<StatusChange, KitchenServiceError> {
        let result = self
            .update_status(&reference, |order, now| order.advance(from, now))
            .await;

        Self::report(&reference, "advance", &result);

        result
    }

    async fn cancel(&self, reference: OrderReference) -> Result<StatusChange, KitchenServiceError> {
        let result = self
            .update_status(&reference, |order, now| order.cancel(now))
            .await;

        Self::report(&reference, "cancel", &result);

        result
    }
}

#[automock]
#[async_trait]
pub trait KitchenService: Send + Sync {
    /// Orders still being worked on, oldest first.
    async fn active_orders(&self) -> Result<Vec<Order>, KitchenServiceError>;

    /// Moves an order to the status after `from`, the status the staff member saw.
    ///
    /// Repeating a request that has already been applied reports the current status.
    async fn advance(
        &self,
        reference: OrderReference,
        from: OrderStatus,
    ) -> Result<StatusChange, KitchenServiceError>;

    /// Cancels an order. Cancelling a cancelled order reports it unchanged.
    async fn cancel(&self, reference: OrderReference) -> Result<StatusChange, KitchenServiceError>;
}
