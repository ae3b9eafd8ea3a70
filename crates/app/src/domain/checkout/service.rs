//! Checkout service.
//!
//! Turns the session basket into an order. The order, its lines and the promo redemption
//! are written in one transaction; the basket is only cleared once that transaction has
//! committed. If the redemption is refused the transaction is rolled back and nothing of
//! the order remains.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tiffin::{
    basket::Basket,
    checkout::{self, CheckoutForm},
    orders::{Order, OrderDraft, OrderReference},
    promotions::RedemptionContext,
};
use tracing::{error, info, warn};

use crate::{
    clock::Clock,
    context::Repositories,
    domain::{
        accounts::mirror_basket,
        checkout::errors::CheckoutServiceError,
        orders::models::OrderRecord,
        promotions::RedemptionError,
        sessions::{ClientAddress, CustomerUuid, Visitor},
    },
    rate_limit::{RateLimitedAction, RateLimiter},
    storage::StoreError,
};

/// Attempts at finding an unused order reference.
const REFERENCE_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct CheckoutCoordinator {
    repositories: Repositories,
    rate_limiter: Arc<dyn RateLimiter>,
    clock: Arc<dyn Clock>,
}

impl CheckoutCoordinator {
    pub fn new(
        repositories: Repositories,
        rate_limiter: Arc<dyn RateLimiter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repositories,
            rate_limiter,
            clock,
        }
    }

    /// Stores the order under a fresh reference, drawing a new one on a clash.
    async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        draft: OrderDraft,
        owner: Option<CustomerUuid>,
        now: Timestamp,
    ) -> Result<Order, CheckoutServiceError> {
        let mut order = Order::place(draft, OrderReference::generate(), now);

        for attempt in 1..=REFERENCE_ATTEMPTS {
            let record = OrderRecord { order, owner };

            if self
                .repositories
                .orders
                .create_order(tx, &record)
                .await?
                .is_some()
            {
                return Ok(record.order);
            }

            warn!(reference = %record.order.reference, attempt, "order reference collision, retrying");

            order = record.order;
            order.reference = OrderReference::generate();
        }

        Err(StoreError::AlreadyExists.into())
    }

    /// Counts one use of the order's promo code, if it has one.
    async fn redeem(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &Order,
    ) -> Result<(), RedemptionError> {
        let Some(code) = order.promo_code.as_deref() else {
            return Ok(());
        };

        self.repositories
            .promotions
            .record_redemption(tx, code)
            .await?;

        Ok(())
    }

    /// Takes a refused promo off the basket so the visitor can check out without it.
    async fn drop_refused_promo(
        &self,
        visitor: Visitor,
        order: &Order,
        mut basket: Basket,
        refused: RedemptionError,
    ) -> CheckoutServiceError {
        let code = order.promo_code.clone().unwrap_or_default();

        warn!(reference = %order.reference, %code, error = %refused, "promo redemption failed");

        if matches!(refused, RedemptionError::Rejected(_)) {
            basket.remove_promo();

            if let Err(error) = self.repositories.sessions.save(visitor.session, &basket).await {
                error!(session = %visitor.session, %error, "failed to save basket after refused redemption");
            }

            mirror_basket(self.repositories.profiles.as_ref(), visitor.customer, &basket).await;
        }

        CheckoutServiceError::from_redemption(&code, refused)
    }

    async fn finish(&self, visitor: Visitor, order: &Order) {
        if let Err(error) = self.repositories.sessions.clear(visitor.session).await {
            error!(session = %visitor.session, %error, "failed to clear basket after checkout");
        }

        if let Err(error) = self
            .repositories
            .sessions
            .set_last_order_reference(visitor.session, &order.reference)
            .await
        {
            error!(session = %visitor.session, %error, "failed to remember order reference");
        }

        mirror_basket(
            self.repositories.profiles.as_ref(),
            visitor.customer,
            &Basket::new(self.repositories.sessions.policy()),
        )
        .await;
    }
}

impl fmt::Debug for CheckoutCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutCoordinator").finish_non_exhaustive()
    }
}

#[async_trait]
impl CheckoutService for CheckoutCoordinator {
    async fn place_order(
        &self,
        visitor: Visitor,
        client: ClientAddress,
        form: CheckoutForm,
    ) -> Result<Order, CheckoutServiceError> {
        self.rate_limiter
            .check(RateLimitedAction::Checkout, &client)?;

        let mut tx = self.repositories.db.begin().await?;

        let menu = self.repositories.menu.menu(&mut tx).await?;
        let mut basket = self.repositories.sessions.load(visitor.session).await?;
        let now = self.clock.now();

        let context = RedemptionContext {
            now,
            customer: self
                .repositories
                .orders
                .customer_history(&mut tx, visitor.customer)
                .await?,
        };

        let rule = match basket.promo() {
            Some(promo) => {
                self.repositories
                    .promotions
                    .find_by_code(&mut tx, &promo.code)
                    .await?
            }
            None => None,
        };

        let draft = match checkout::draft_order(&mut basket, &menu, &form, rule.as_ref(), &context)
        {
            Ok(draft) => draft,
            Err(refused) => {
                if refused.basket_changed() {
                    self.repositories
                        .sessions
                        .save(visitor.session, &basket)
                        .await?;
                    mirror_basket(self.repositories.profiles.as_ref(), visitor.customer, &basket)
                        .await;
                }

                info!(session = %visitor.session, error = %refused, "checkout refused");

                return Err(refused.into());
            }
        };

        let order = self.create_order(&mut tx, draft, visitor.customer, now).await?;

        if let Err(refused) = self.redeem(&mut tx, &order).await {
            tx.rollback().await?;

            return Err(self.drop_refused_promo(visitor, &order, basket, refused).await);
        }

        tx.commit().await?;

        self.finish(visitor, &order).await;

        info!(
            reference = %order.reference,
            delivery_type = order.delivery_type.label(),
            total = %order.totals.total,
            promo = order.promo_code.as_deref(),
            "order placed"
        );

        Ok(order)
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Places an order for the visitor's basket and empties the basket.
    async fn place_order(
        &self,
        visitor: Visitor,
        client: ClientAddress,
        form: CheckoutForm,
    ) -> Result<Order, CheckoutServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;
    use tiffin::{
        checkout::CheckoutError,
        orders::{DeliveryType, OrderStatus},
        pricing::Price,
        promotions::{DiscountKind, DiscountRule, InvalidPromo, RuleScope},
    };

    use crate::{
        domain::{
            baskets::BasketsService,
            kitchen::KitchenService,
            orders::OrdersService,
            sessions::{CustomerUuid, SessionUuid},
        },
        rate_limit::RateLimited,
        test::{CHANA_MASALA, DAL_MAKHANI, GARLIC_NAAN, TestContext, checkout_form},
    };

    use super::*;

    fn gbp(minor: i64) -> Price {
        Money::from_minor(minor, GBP)
    }

    fn client() -> ClientAddress {
        ClientAddress::new("198.51.100.20")
    }

    #[tokio::test]
    async fn collection_order_with_promo_snapshots_the_basket() -> TestResult {
        let ctx = TestContext::new().await?;
        let visitor = Visitor::guest(SessionUuid::new());

        ctx.add_promotion(&DiscountRule::new("SAVE2", DiscountKind::amount_off(gbp(2_00))?))
            .await?;

        ctx.baskets.add_item(visitor, CHANA_MASALA, 1).await?;
        ctx.baskets
            .apply_promo(visitor, client(), "SAVE2".to_string())
            .await?;

        let order = ctx
            .checkout
            .place_order(visitor, client(), checkout_form(DeliveryType::Collection))
            .await?;

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.totals.subtotal, gbp(9_50));
        assert_eq!(order.totals.delivery_charge, gbp(0));
        assert_eq!(order.totals.discount, gbp(2_00));
        assert_eq!(order.totals.total, gbp(7_50));
        assert_eq!(order.promo_code.as_deref(), Some("SAVE2"));
        assert_eq!(order.items.len(), 1);
        assert_eq!(
            order.items.first().map(|item| item.item_name.as_str()),
            Some("Chana Masala")
        );

        assert!(ctx.repositories.sessions.load(visitor.session).await?.is_blank());
        assert_eq!(
            ctx.repositories
                .sessions
                .last_order_reference(visitor.session)
                .await?,
            Some(order.reference.clone())
        );
        assert_eq!(
            ctx.find_promotion("SAVE2").await?.map(|rule| rule.uses_count),
            Some(1)
        );

        let stored = ctx.orders.get_order(visitor, order.reference.clone()).await?;
        assert_eq!(stored, order);

        Ok(())
    }

    #[tokio::test]
    async fn delivery_charge_is_frozen_on_the_order() -> TestResult {
        let ctx = TestContext::new().await?;
        let visitor = Visitor::guest(SessionUuid::new());

        ctx.baskets.add_item(visitor, DAL_MAKHANI, 1).await?;
        ctx.baskets.add_item(visitor, GARLIC_NAAN, 1).await?;

        let order = ctx
            .checkout
            .place_order(visitor, client(), checkout_form(DeliveryType::Delivery))
            .await?;

        assert_eq!(order.totals.subtotal, gbp(11_50));
        assert_eq!(order.totals.delivery_charge, gbp(2_50));
        assert_eq!(order.totals.total, gbp(14_00));
        assert!(order.address.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn empty_baskets_cannot_check_out() -> TestResult {
        let ctx = TestContext::new().await?;

        let result = ctx
            .checkout
            .place_order(
                Visitor::guest(SessionUuid::new()),
                client(),
                checkout_form(DeliveryType::Collection),
            )
            .await;

        assert_eq!(
            result,
            Err(CheckoutServiceError::Checkout(CheckoutError::EmptyBasket))
        );

        Ok(())
    }

    #[tokio::test]
    async fn small_delivery_orders_are_refused_without_changes() -> TestResult {
        let ctx = TestContext::new().await?;
        let visitor = Visitor::guest(SessionUuid::new());

        ctx.baskets.add_item(visitor, GARLIC_NAAN, 1).await?;

        let result = ctx
            .checkout
            .place_order(visitor, client(), checkout_form(DeliveryType::Delivery))
            .await;

        assert!(matches!(
            result,
            Err(CheckoutServiceError::Checkout(
                CheckoutError::BelowMinimumOrder { .. }
            ))
        ));
        assert_eq!(ctx.repositories.sessions.load(visitor.session).await?.len(), 1);
        assert!(ctx.kitchen.active_orders().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn expired_promos_are_removed_at_checkout() -> TestResult {
        let ctx = TestContext::new().await?;
        let visitor = Visitor::guest(SessionUuid::new());

        let mut flash = DiscountRule::new("FLASH", DiscountKind::amount_off(gbp(1_00))?);
        flash.valid_until = Some(ctx.clock.now().checked_add(SignedDuration::from_mins(10))?);
        ctx.add_promotion(&flash).await?;

        ctx.baskets.add_item(visitor, CHANA_MASALA, 1).await?;
        ctx.baskets
            .apply_promo(visitor, client(), "FLASH".to_string())
            .await?;

        ctx.clock.advance(SignedDuration::from_mins(15));

        let result = ctx
            .checkout
            .place_order(visitor, client(), checkout_form(DeliveryType::Collection))
            .await;

        assert_eq!(
            result,
            Err(CheckoutServiceError::Checkout(CheckoutError::PromoRemoved {
                code: "FLASH".to_string(),
                reason: InvalidPromo::Expired,
            }))
        );

        let basket = ctx.repositories.sessions.load(visitor.session).await?;
        assert!(basket.promo().is_none());
        assert_eq!(basket.len(), 1);
        assert!(ctx.kitchen.active_orders().await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn first_order_offers_are_rechecked_at_checkout() -> TestResult {
        let ctx = TestContext::new().await?;
        let customer = CustomerUuid::new();

        let mut welcome = DiscountRule::new("WELCOME", DiscountKind::amount_off(gbp(3_00))?);
        welcome.scope = RuleScope::AutoApplied;
        welcome.first_order_only = true;
        ctx.add_promotion(&welcome).await?;

        let first_tab = Visitor::customer(SessionUuid::new(), customer);
        let second_tab = Visitor::customer(SessionUuid::new(), customer);

        ctx.baskets.add_item(first_tab, CHANA_MASALA, 1).await?;
        ctx.baskets.add_item(second_tab, DAL_MAKHANI, 1).await?;

        ctx.checkout
            .place_order(first_tab, client(), checkout_form(DeliveryType::Collection))
            .await?;

        let result = ctx
            .checkout
            .place_order(second_tab, client(), checkout_form(DeliveryType::Collection))
            .await;

        assert_eq!(
            result,
            Err(CheckoutServiceError::Checkout(CheckoutError::PromoRemoved {
                code: "WELCOME".to_string(),
                reason: InvalidPromo::NotFirstOrder,
            }))
        );

        Ok(())
    }

    #[tokio::test]
    async fn refused_redemptions_roll_back_the_order() -> TestResult {
        let ctx = TestContext::new().await?;
        let visitor = Visitor::guest(SessionUuid::new());

        let mut last_one = DiscountRule::new("LASTONE", DiscountKind::amount_off(gbp(1_00))?);
        last_one.max_uses = Some(1);
        ctx.add_promotion(&last_one).await?;

        ctx.baskets.add_item(visitor, CHANA_MASALA, 1).await?;
        ctx.baskets
            .apply_promo(visitor, client(), "LASTONE".to_string())
            .await?;

        let mut tx = ctx.repositories.db.begin().await?;

        let mut basket = ctx.repositories.sessions.load(visitor.session).await?;
        let rule = ctx.find_promotion("LASTONE").await?;
        let draft = checkout::draft_order(
            &mut basket,
            &ctx.repositories.menu.menu(&mut tx).await?,
            &checkout_form(DeliveryType::Collection),
            rule.as_ref(),
            &RedemptionContext::guest(ctx.clock.now()),
        )?;

        // Another checkout takes the last use in the meantime.
        ctx.record_redemption("LASTONE").await?;

        let order = ctx
            .checkout
            .create_order(&mut tx, draft, None, ctx.clock.now())
            .await?;
        let refused = ctx.checkout.redeem(&mut tx, &order).await;

        assert_eq!(
            refused,
            Err(RedemptionError::Rejected(InvalidPromo::Exhausted))
        );

        tx.rollback().await?;

        let mut check = ctx.repositories.db.begin().await?;
        assert_eq!(
            ctx.repositories
                .orders
                .get_order(&mut check, &order.reference)
                .await?,
            None
        );

        let error = ctx
            .checkout
            .drop_refused_promo(visitor, &order, basket, RedemptionError::Rejected(InvalidPromo::Exhausted))
            .await;

        assert_eq!(
            error,
            CheckoutServiceError::PromoRejected {
                code: "LASTONE".to_string(),
                reason: InvalidPromo::Exhausted,
            }
        );

        let saved = ctx.repositories.sessions.load(visitor.session).await?;
        assert!(saved.promo().is_none());
        assert_eq!(saved.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn redemptions_commit_with_the_order() -> TestResult {
        let ctx = TestContext::new().await?;
        let visitor = Visitor::guest(SessionUuid::new());

        let mut twice = DiscountRule::new("TWICE", DiscountKind::amount_off(gbp(1_00))?);
        twice.max_uses = Some(2);
        ctx.add_promotion(&twice).await?;

        for _ in 0..2 {
            ctx.baskets.add_item(visitor, CHANA_MASALA, 1).await?;
            ctx.baskets
                .apply_promo(visitor, client(), "TWICE".to_string())
                .await?;
            ctx.checkout_basket(visitor, DeliveryType::Collection).await?;
        }

        assert_eq!(
            ctx.find_promotion("TWICE").await?.map(|rule| rule.uses_count),
            Some(2)
        );
        assert_eq!(ctx.kitchen.active_orders().await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn checkout_attempts_are_rate_limited() -> TestResult {
        let ctx = TestContext::new().await?;
        let visitor = Visitor::guest(SessionUuid::new());

        for _ in 0..5 {
            let attempt = ctx
                .checkout
                .place_order(visitor, client(), checkout_form(DeliveryType::Collection))
                .await;
            assert!(matches!(attempt, Err(CheckoutServiceError::Checkout(_))));
        }

        ctx.baskets.add_item(visitor, CHANA_MASALA, 1).await?;

        let refused = ctx
            .checkout
            .place_order(visitor, client(), checkout_form(DeliveryType::Collection))
            .await;

        assert!(matches!(
            refused,
            Err(CheckoutServiceError::RateLimited(RateLimited { .. }))
        ));
        assert_eq!(ctx.repositories.sessions.load(visitor.session).await?.len(), 1);

        Ok(())
    }
}
