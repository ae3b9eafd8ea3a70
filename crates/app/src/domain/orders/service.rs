//! Orders service.
//!
//! Customer-facing order lookups. Customers see an order when their account placed it, or
//! when it is the last order placed from their session (guest checkout).

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use tiffin::orders::{Order, OrderReference};

use crate::{
    clock::Clock,
    context::Repositories,
    domain::{
        orders::{
            errors::OrdersServiceError,
            models::{OrderRecord, OrderStatusView},
        },
        sessions::{CustomerUuid, Visitor},
    },
};

#[derive(Clone)]
pub struct PgOrdersService {
    repositories: Repositories,
    clock: Arc<dyn Clock>,
}

impl PgOrdersService {
    pub fn new(repositories: Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            repositories,
            clock,
        }
    }

    async fn authorised_record(
        &self,
        visitor: Visitor,
        reference: &OrderReference,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.repositories.db.begin().await?;

        let record = self
            .repositories
            .orders
            .get_order(&mut tx, reference)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        tx.commit().await?;

        let owns = visitor.customer.is_some() && record.owner == visitor.customer;

        if owns {
            return Ok(record);
        }

        let last_order = self
            .repositories
            .sessions
            .last_order_reference(visitor.session)
            .await?;

        // Someone else's order is reported as missing rather than forbidden.
        if last_order.as_ref() == Some(reference) {
            Ok(record)
        } else {
            Err(OrdersServiceError::NotFound)
        }
    }
}

impl fmt::Debug for PgOrdersService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgOrdersService").finish_non_exhaustive()
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn order_status(
        &self,
        visitor: Visitor,
        reference: OrderReference,
    ) -> Result<OrderStatusView, OrdersServiceError> {
        let record = self.authorised_record(visitor, &reference).await?;

        Ok(OrderStatusView::new(&record.order, self.clock.now()))
    }

    async fn get_order(
        &self,
        visitor: Visitor,
        reference: OrderReference,
    ) -> Result<Order, OrdersServiceError> {
        Ok(self.authorised_record(visitor, &reference).await?.order)
    }

    async fn order_history(&self, customer: CustomerUuid) -> Result<Vec<Order>, OrdersServiceError> {
        let mut tx = self.repositories.db.begin().await?;

        let orders = self
            .repositories
            .orders
            .customer_orders(&mut tx, customer)
            .await?;

        tx.commit().await?;

        Ok(orders)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Status and estimate for an order the visitor may see.
    async fn order_status(
        &self,
        visitor: Visitor,
        reference: OrderReference,
    ) -> Result<OrderStatusView, OrdersServiceError>;

    /// Full details of an order the visitor may see.
    async fn get_order(
        &self,
        visitor: Visitor,
        reference: OrderReference,
    ) -> Result<Order, OrdersServiceError>;

    /// A customer's orders, newest first.
    async fn order_history(&self, customer: CustomerUuid) -> Result<Vec<Order>, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use testresult::TestResult;
    use tiffin::orders::{DeliveryType, OrderStatus};

    use crate::{
        domain::sessions::{CustomerUuid, SessionUuid},
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn guests_poll_their_last_order() -> TestResult {
        let ctx = TestContext::new().await?;
        let guest = Visitor::guest(SessionUuid::new());

        let order = ctx.place_order(guest, DeliveryType::Delivery).await?;

        let view = ctx.orders.order_status(guest, order.reference.clone()).await?;

        assert_eq!(view.status, OrderStatus::Pending);
        assert_eq!(view.estimate.minutes_remaining, Some(45));
        assert_eq!(
            view.estimate.ready_at,
            Some(ctx.clock.now().checked_add(SignedDuration::from_mins(45))?)
        );

        Ok(())
    }

    #[tokio::test]
    async fn other_sessions_cannot_see_the_order() -> TestResult {
        let ctx = TestContext::new().await?;
        let guest = Visitor::guest(SessionUuid::new());

        let order = ctx.place_order(guest, DeliveryType::Collection).await?;

        let stranger = Visitor::guest(SessionUuid::new());
        let result = ctx.orders.order_status(stranger, order.reference).await;

        assert_eq!(result, Err(OrdersServiceError::NotFound));

        Ok(())
    }

    #[tokio::test]
    async fn owners_see_their_orders_from_any_session() -> TestResult {
        let ctx = TestContext::new().await?;
        let customer = CustomerUuid::new();

        let order = ctx
            .place_order(
                Visitor::customer(SessionUuid::new(), customer),
                DeliveryType::Collection,
            )
            .await?;

        let elsewhere = Visitor::customer(SessionUuid::new(), customer);

        let found = ctx.orders.get_order(elsewhere, order.reference.clone()).await?;
        assert_eq!(found.reference, order.reference);

        let history = ctx.orders.order_history(customer).await?;
        assert_eq!(history.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_references_are_not_found() -> TestResult {
        let ctx = TestContext::new().await?;

        let result = ctx
            .orders
            .order_status(Visitor::guest(SessionUuid::new()), "FFFF0000".parse()?)
            .await;

        assert_eq!(result, Err(OrdersServiceError::NotFound));

        Ok(())
    }
}
