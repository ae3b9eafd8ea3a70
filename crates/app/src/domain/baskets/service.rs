//! Baskets service.
//!
//! Every operation loads the session basket, applies the change, rechecks the promotion
//! against the new subtotal, offers the best auto-applied promotion when none is applied,
//! then writes the basket back.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use tiffin::{
    basket::Basket,
    catalog::{Catalog, ItemId, MenuSnapshot},
    orders::OrderReference,
    promotions::{self, InvalidPromo, PromoCheck, RedemptionContext},
};
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};

use crate::{
    clock::Clock,
    context::Repositories,
    domain::{
        accounts::mirror_basket,
        baskets::{
            errors::BasketsServiceError,
            models::{BasketUpdate, BasketView, ReorderOutcome},
        },
        sessions::{ClientAddress, Visitor},
    },
    rate_limit::{RateLimitedAction, RateLimiter},
};

#[derive(Clone)]
pub struct PgBasketsService {
    repositories: Repositories,
    rate_limiter: Arc<dyn RateLimiter>,
    clock: Arc<dyn Clock>,
}

impl PgBasketsService {
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

    async fn redemption_context(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        visitor: Visitor,
    ) -> Result<RedemptionContext, sqlx::Error> {
        Ok(RedemptionContext {
            now: self.clock.now(),
            customer: self
                .repositories
                .orders
                .customer_history(tx, visitor.customer)
                .await?,
        })
    }

    /// Loads the basket, applies `change`, then rechecks promotions and saves.
    ///
    /// Nothing is saved when `change` fails.
    async fn mutate<T: Send>(
        &self,
        visitor: Visitor,
        change: impl FnOnce(&mut Basket, &MenuSnapshot) -> Result<T, BasketsServiceError> + Send,
    ) -> Result<(BasketUpdate, T), BasketsServiceError> {
        let mut tx = self.repositories.db.begin().await?;

        let menu = self.repositories.menu.menu(&mut tx).await?;
        let mut basket = self.repositories.sessions.load(visitor.session).await?;

        let output = change(&mut basket, &menu)?;

        let update = self.refresh(&mut tx, visitor, basket, &menu).await?;

        tx.commit().await?;

        Ok((update, output))
    }

    async fn refresh(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        visitor: Visitor,
        mut basket: Basket,
        menu: &MenuSnapshot,
    ) -> Result<BasketUpdate, BasketsServiceError> {
        let context = self.redemption_context(tx, visitor).await?;

        let rule = match basket.promo() {
            Some(promo) => {
                self.repositories
                    .promotions
                    .find_by_code(tx, &promo.code)
                    .await?
            }
            None => None,
        };

        let check = promotions::revalidate(&mut basket, rule.as_ref(), &context);

        if let PromoCheck::Removed { code, reason } = &check {
            info!(session = %visitor.session, %code, %reason, "promo removed from basket");
        }

        if basket.promo().is_none() && !basket.is_empty() {
            let offers = self.repositories.promotions.auto_offers(tx).await?;

            if let Some((offer, discount)) =
                promotions::best_auto_offer(&offers, &basket.subtotal(), &context)
            {
                basket.apply_promo(&offer.code, discount)?;

                debug!(session = %visitor.session, code = %offer.code, "auto offer applied");
            }
        }

        self.repositories
            .sessions
            .save(visitor.session, &basket)
            .await?;

        mirror_basket(self.repositories.profiles.as_ref(), visitor.customer, &basket).await;

        Ok(BasketUpdate {
            promo_removed: check.was_removed(),
            warning: check.warning(),
            basket: BasketView::new(basket, menu),
        })
    }
}

impl fmt::Debug for PgBasketsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgBasketsService").finish_non_exhaustive()
    }
}

#[async_trait]
impl BasketsService for PgBasketsService {
    async fn get_basket(&self, visitor: Visitor) -> Result<BasketUpdate, BasketsServiceError> {
        let (update, ()) = self.mutate(visitor, |_, _| Ok(())).await?;

        Ok(update)
    }

    async fn add_item(
        &self,
        visitor: Visitor,
        item: ItemId,
        quantity: u32,
    ) -> Result<BasketUpdate, BasketsServiceError> {
        let (update, ()) = self
            .mutate(visitor, |basket, menu| {
                let item = menu
                    .get_orderable(item)
                    .ok_or(BasketsServiceError::ItemNotFound)?;

                basket.add(item, quantity)?;

                Ok(())
            })
            .await?;

        Ok(update)
    }

    async fn update_item(
        &self,
        visitor: Visitor,
        item: ItemId,
        quantity: i64,
    ) -> Result<BasketUpdate, BasketsServiceError> {
        let (update, ()) = self
            .mutate(visitor, |basket, _| Ok(basket.update(item, quantity)?))
            .await?;

        Ok(update)
    }

    async fn remove_item(
        &self,
        visitor: Visitor,
        item: ItemId,
    ) -> Result<BasketUpdate, BasketsServiceError> {
        let (update, _removed) = self
            .mutate(visitor, |basket, _| Ok(basket.remove(item)))
            .await?;

        Ok(update)
    }

    async fn set_notes(
        &self,
        visitor: Visitor,
        item: ItemId,
        notes: String,
    ) -> Result<BasketUpdate, BasketsServiceError> {
        let (update, _found) = self
            .mutate(visitor, |basket, _| Ok(basket.set_notes(item, &notes)))
            .await?;

        Ok(update)
    }

    async fn apply_promo(
        &self,
        visitor: Visitor,
        client: ClientAddress,
        code: String,
    ) -> Result<BasketUpdate, BasketsServiceError> {
        self.rate_limiter
            .check(RateLimitedAction::ApplyPromo, &client)?;

        let mut tx = self.repositories.db.begin().await?;

        let rule = self
            .repositories
            .promotions
            .find_by_code(&mut tx, &code)
            .await?
            .filter(|rule| !rule.is_auto_applied())
            .ok_or(InvalidPromo::Unknown)?;

        let context = self.redemption_context(&mut tx, visitor).await?;

        tx.commit().await?;

        let (update, discount) = self
            .mutate(visitor, |basket, _| Ok(rule.apply_to(basket, &context)?))
            .await?;

        info!(
            session = %visitor.session,
            code = %rule.code,
            discount = %discount,
            "promo applied"
        );

        Ok(update)
    }

    async fn remove_promo(&self, visitor: Visitor) -> Result<BasketUpdate, BasketsServiceError> {
        let (update, _removed) = self
            .mutate(visitor, |basket, _| Ok(basket.remove_promo()))
            .await?;

        Ok(update)
    }

    async fn reorder(
        &self,
        visitor: Visitor,
        reference: OrderReference,
    ) -> Result<ReorderOutcome, BasketsServiceError> {
        let mut tx = self.repositories.db.begin().await?;

        let record = self
            .repositories
            .orders
            .get_order(&mut tx, &reference)
            .await?
            .ok_or(BasketsServiceError::OrderNotFound)?;

        tx.commit().await?;

        if visitor.customer.is_none() || record.owner != visitor.customer {
            return Err(BasketsServiceError::OrderNotFound);
        }

        let (update, (added, skipped)) = self
            .mutate(visitor, |basket, menu| {
                let (mut added, mut skipped) = (0_usize, 0_usize);

                for line in &record.order.items {
                    let Some(item) = line.item_id.and_then(|id| menu.get_orderable(id)) else {
                        skipped += 1;
                        continue;
                    };

                    let had_line = basket.line(item.id).is_some();

                    if basket.add(item, line.quantity).is_err() {
                        skipped += 1;
                        continue;
                    }

                    if let Some(notes) = line.notes.as_deref().filter(|_| !had_line) {
                        basket.set_notes(item.id, notes);
                    }

                    added += 1;
                }

                Ok((added, skipped))
            })
            .await?;

        info!(
            session = %visitor.session,
            reference = %reference,
            added,
            skipped,
            "order copied into basket"
        );

        Ok(ReorderOutcome {
            update,
            added,
            skipped,
        })
    }
}

#[automock]
#[async_trait]
pub trait BasketsService: Send + Sync {
    /// The visitor's basket, with auto-applied offers.
    async fn get_basket(&self, visitor: Visitor) -> Result<BasketUpdate, BasketsServiceError>;

    /// Adds units of a menu item at its current price.
    async fn add_item(
        &self,
        visitor: Visitor,
        item: ItemId,
        quantity: u32,
    ) -> Result<BasketUpdate, BasketsServiceError>;

    /// Sets a line's quantity; zero or less removes it.
    async fn update_item(
        &self,
        visitor: Visitor,
        item: ItemId,
        quantity: i64,
    ) -> Result<BasketUpdate, BasketsServiceError>;

    async fn remove_item(
        &self,
        visitor: Visitor,
        item: ItemId,
    ) -> Result<BasketUpdate, BasketsServiceError>;

    /// Sets kitchen notes on a line; empty notes clear them.
    async fn set_notes(
        &self,
        visitor: Visitor,
        item: ItemId,
        notes: String,
    ) -> Result<BasketUpdate, BasketsServiceError>;

    /// Applies a promo code, replacing any current promotion.
    async fn apply_promo(
        &self,
        visitor: Visitor,
        client: ClientAddress,
        code: String,
    ) -> Result<BasketUpdate, BasketsServiceError>;

    async fn remove_promo(&self, visitor: Visitor) -> Result<BasketUpdate, BasketsServiceError>;

    /// Copies the lines of one of the customer's past orders into the basket.
    async fn reorder(
        &self,
        visitor: Visitor,
        reference: OrderReference,
    ) -> Result<ReorderOutcome, BasketsServiceError>;
}
