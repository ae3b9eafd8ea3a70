//! Basket
//!
//! The in-progress order of one visitor. Lines are keyed by menu item and carry the unit
//! price captured when the item was first added; the catalog is only consulted again to
//! resolve names for display and checkout.

use std::collections::{BTreeMap, btree_map};

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    catalog::{Catalog, CatalogItem, ItemId},
    orders::DeliveryType,
    pricing::{Price, PricingPolicy},
};

pub mod snapshot;

pub use snapshot::{BasketSnapshot, LineSnapshot, PromoSnapshot, SnapshotError};

/// Longest note kept for a line, in characters.
pub const MAX_NOTES_LEN: usize = 300;

/// Largest quantity a single line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors related to basket mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BasketError {
    /// Items must be added at least once.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// The resulting line quantity would exceed [`MAX_LINE_QUANTITY`].
    #[error("quantity {0} is more than the {MAX_LINE_QUANTITY} allowed per item")]
    QuantityOutOfRange(i64),

    /// The item is not currently being served.
    #[error("item {0} is not available")]
    Unavailable(ItemId),

    /// A price is in a different currency from the basket (price currency, basket currency).
    #[error("price in {0} cannot be added to a {1} basket")]
    CurrencyMismatch(&'static str, &'static str),
}

/// One menu item in the basket.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketLine {
    /// Menu item
    pub item_id: ItemId,

    /// Units of the item, at least 1
    pub quantity: u32,

    /// Unit price captured when the item was added
    pub unit_price: Price,

    /// Kitchen notes, e.g. "no onions"
    pub notes: Option<String>,
}

impl BasketLine {
    /// Unit price times quantity.
    pub fn line_total(&self) -> Price {
        Money::from_minor(
            self.unit_price
                .to_minor_units()
                .saturating_mul(i64::from(self.quantity)),
            self.unit_price.currency(),
        )
    }
}

/// Promotion currently applied to the basket.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPromo {
    /// Upper-cased code
    pub code: String,

    /// Discount computed when the promo was last validated
    pub discount: Price,
}

/// Display totals for a basket.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketSummary {
    /// Delivery type the totals were computed for
    pub delivery_type: DeliveryType,

    /// Units across all lines
    pub total_quantity: u32,

    /// Sum of line totals
    pub subtotal: Price,

    /// Delivery charge
    pub delivery_charge: Price,

    /// Discount, never more than the subtotal
    pub discount: Price,

    /// Amount payable
    pub total: Price,

    /// Applied promotion
    pub promo: Option<AppliedPromo>,

    /// Amount still needed for free delivery
    pub free_delivery_shortfall: Option<Price>,
}

/// A visitor's basket.
#[derive(Debug, Clone, PartialEq)]
pub struct Basket {
    policy: PricingPolicy,
    lines: BTreeMap<ItemId, BasketLine>,
    promo: Option<AppliedPromo>,
}

impl Basket {
    /// Creates an empty basket priced under the given policy.
    pub fn new(policy: PricingPolicy) -> Self {
        Self {
            policy,
            lines: BTreeMap::new(),
            promo: None,
        }
    }

    /// Pricing policy the basket uses.
    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Currency of the basket.
    pub fn currency(&self) -> &'static Currency {
        self.policy.currency
    }

    /// Adds `quantity` units of an item, capturing its price if the item is new.
    ///
    /// # Errors
    ///
    /// - [`BasketError::ZeroQuantity`]: `quantity` is zero.
    /// - [`BasketError::Unavailable`]: the item is not being served.
    /// - [`BasketError::CurrencyMismatch`]: the item is priced in another currency.
    /// - [`BasketError::QuantityOutOfRange`]: the line would exceed [`MAX_LINE_QUANTITY`].
    pub fn add(&mut self, item: &CatalogItem, quantity: u32) -> Result<&BasketLine, BasketError> {
        if quantity == 0 {
            return Err(BasketError::ZeroQuantity);
        }

        if !item.is_available {
            return Err(BasketError::Unavailable(item.id));
        }

        self.check_currency(&item.price)?;

        let existing = self.lines.get(&item.id).map_or(0, |line| line.quantity);
        let quantity = existing.saturating_add(quantity);

        if quantity > MAX_LINE_QUANTITY {
            return Err(BasketError::QuantityOutOfRange(i64::from(quantity)));
        }

        let line = self.lines.entry(item.id).or_insert_with(|| BasketLine {
            item_id: item.id,
            quantity: 0,
            unit_price: item.price,
            notes: None,
        });

        line.quantity = quantity;

        Ok(line)
    }

    /// Sets the quantity of a line. Zero or less removes it; absent lines are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::QuantityOutOfRange`] above [`MAX_LINE_QUANTITY`].
    pub fn update(&mut self, item_id: ItemId, quantity: i64) -> Result<(), BasketError> {
        if quantity <= 0 {
            self.remove(item_id);

            return Ok(());
        }

        let Some(line) = self.lines.get_mut(&item_id) else {
            return Ok(());
        };

        line.quantity = u32::try_from(quantity)
            .ok()
            .filter(|quantity| *quantity <= MAX_LINE_QUANTITY)
            .ok_or(BasketError::QuantityOutOfRange(quantity))?;

        Ok(())
    }

    /// Removes a line, returning it if it was present.
    pub fn remove(&mut self, item_id: ItemId) -> Option<BasketLine> {
        self.lines.remove(&item_id)
    }

    /// Sets the kitchen notes for a line. Returns whether the line exists.
    ///
    /// Notes are trimmed and cut to [`MAX_NOTES_LEN`] characters; blank notes clear the note.
    pub fn set_notes(&mut self, item_id: ItemId, notes: &str) -> bool {
        match self.lines.get_mut(&item_id) {
            Some(line) => {
                line.notes = normalise_notes(notes);
                true
            }
            None => false,
        }
    }

    /// Applies a promotion, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::CurrencyMismatch`] if the discount is in another currency.
    pub fn apply_promo(&mut self, code: &str, discount: Price) -> Result<(), BasketError> {
        self.check_currency(&discount)?;

        self.promo = Some(AppliedPromo {
            code: code.trim().to_uppercase(),
            discount,
        });

        Ok(())
    }

    /// Removes the applied promotion, returning it if there was one.
    pub fn remove_promo(&mut self) -> Option<AppliedPromo> {
        self.promo.take()
    }

    /// Empties the basket, lines and promotion together.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.promo = None;
    }

    /// Applied promotion, if any.
    pub fn promo(&self) -> Option<&AppliedPromo> {
        self.promo.as_ref()
    }

    /// Whether the basket has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether there is nothing worth keeping: no lines and no promotion.
    pub fn is_blank(&self) -> bool {
        self.lines.is_empty() && self.promo.is_none()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// A single line.
    pub fn line(&self, item_id: ItemId) -> Option<&BasketLine> {
        self.lines.get(&item_id)
    }

    /// All lines in item order, without catalog resolution.
    pub fn raw_lines(&self) -> impl Iterator<Item = &BasketLine> {
        self.lines.values()
    }

    /// Units across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.lines
            .values()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of line totals.
    pub fn subtotal(&self) -> Price {
        Money::from_minor(
            self.lines
                .values()
                .fold(0_i64, |acc, line| {
                    acc.saturating_add(line.line_total().to_minor_units())
                }),
            self.currency(),
        )
    }

    /// Delivery charge for the current subtotal.
    pub fn delivery_charge(&self, delivery_type: DeliveryType) -> Price {
        self.policy.delivery_charge(delivery_type, &self.subtotal())
    }

    /// Discount of the applied promotion, never more than the subtotal.
    pub fn discount(&self) -> Price {
        let subtotal = self.subtotal().to_minor_units().max(0);

        let discount = self
            .promo
            .as_ref()
            .map_or(0, |promo| promo.discount.to_minor_units())
            .clamp(0, subtotal);

        Money::from_minor(discount, self.currency())
    }

    /// Amount payable: subtotal plus delivery minus discount, never negative.
    pub fn total(&self, delivery_type: DeliveryType) -> Price {
        let total = self.subtotal().to_minor_units()
            + self.delivery_charge(delivery_type).to_minor_units()
            - self.discount().to_minor_units();

        Money::from_minor(total.max(0), self.currency())
    }

    /// Totals for display.
    pub fn summary(&self, delivery_type: DeliveryType) -> BasketSummary {
        let subtotal = self.subtotal();

        let free_delivery_shortfall = match delivery_type {
            DeliveryType::Delivery => self.policy.free_delivery_shortfall(&subtotal),
            DeliveryType::Collection => None,
        };

        BasketSummary {
            delivery_type,
            total_quantity: self.total_quantity(),
            subtotal,
            delivery_charge: self.delivery_charge(delivery_type),
            discount: self.discount(),
            total: self.total(delivery_type),
            promo: self.promo.clone(),
            free_delivery_shortfall,
        }
    }

    /// Lines resolved against the catalog, skipping items that have left the menu.
    ///
    /// The iterator borrows the basket and can be cloned to walk the lines again.
    pub fn lines<'a, C: Catalog>(&'a self, catalog: &'a C) -> ResolvedLines<'a, C> {
        ResolvedLines {
            lines: self.lines.values(),
            catalog,
        }
    }

    /// Drops lines whose items are missing from the catalog or no longer available.
    ///
    /// Returns the dropped item ids.
    pub fn prune_unorderable<C: Catalog>(&mut self, catalog: &C) -> Vec<ItemId> {
        let dropped: Vec<ItemId> = self
            .lines
            .keys()
            .copied()
            .filter(|id| catalog.get_orderable(*id).is_none())
            .collect();

        for id in &dropped {
            self.lines.remove(id);
        }

        dropped
    }

    /// Merges a basket saved at sign-out into this one.
    ///
    /// Lines already in this basket win; saved lines for other items are copied across. The
    /// saved promotion is only adopted if this basket has none. Saved lines priced in another
    /// currency are dropped.
    pub fn merge_saved(&mut self, saved: Basket) {
        let currency = self.currency();

        for (id, line) in saved.lines {
            if line.unit_price.currency() != currency {
                continue;
            }

            if let btree_map::Entry::Vacant(entry) = self.lines.entry(id) {
                entry.insert(line);
            }
        }

        if self.promo.is_none() {
            self.promo = saved
                .promo
                .filter(|promo| promo.discount.currency() == currency);
        }
    }

    fn check_currency(&self, price: &Price) -> Result<(), BasketError> {
        let currency = price.currency();

        if currency == self.currency() {
            Ok(())
        } else {
            Err(BasketError::CurrencyMismatch(
                currency.iso_alpha_code,
                self.currency().iso_alpha_code,
            ))
        }
    }

    pub(crate) fn set_promo_discount(&mut self, discount: Price) {
        if let Some(promo) = self.promo.as_mut() {
            promo.discount = discount;
        }
    }

    pub(crate) fn insert_line(&mut self, line: BasketLine) {
        self.lines.insert(line.item_id, line);
    }
}

impl Default for Basket {
    fn default() -> Self {
        Self::new(PricingPolicy::default())
    }
}

pub(crate) fn normalise_notes(notes: &str) -> Option<String> {
    let trimmed = notes.trim();

    if trimmed.is_empty() {
        return None;
    }

    Some(trimmed.chars().take(MAX_NOTES_LEN).collect())
}

/// A basket line together with the catalog item it refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLine<'a> {
    /// Basket line
    pub line: &'a BasketLine,

    /// Catalog entry for the line's item
    pub item: &'a CatalogItem,
}

impl ResolvedLine<'_> {
    /// Unit price captured on the basket line times quantity.
    pub fn line_total(&self) -> Price {
        self.line.line_total()
    }
}

/// Iterator over [`ResolvedLine`]s.
#[derive(Debug)]
pub struct ResolvedLines<'a, C> {
    lines: btree_map::Values<'a, ItemId, BasketLine>,
    catalog: &'a C,
}

impl<C> Clone for ResolvedLines<'_, C> {
    fn clone(&self) -> Self {
        Self {
            lines: self.lines.clone(),
            catalog: self.catalog,
        }
    }
}

impl<'a, C: Catalog> Iterator for ResolvedLines<'a, C> {
    type Item = ResolvedLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let catalog = self.catalog;

        self.lines.find_map(|line| {
            catalog
                .get_item(line.item_id)
                .map(|item| ResolvedLine { line, item })
        })
    }
}
