//! Basket Models

use tiffin::{
    basket::{Basket, BasketSummary},
    catalog::{ItemId, MenuSnapshot},
    orders::DeliveryType,
    pricing::Price,
};

/// A basket line as the customer sees it, with the menu name.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketLineView {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
    pub notes: Option<String>,
}

/// A basket with its lines resolved against the menu.
///
/// Lines whose item has left the menu are not listed, but still count towards the totals
/// until checkout removes them.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketView {
    pub basket: Basket,
    pub lines: Vec<BasketLineView>,
}

impl BasketView {
    pub fn new(basket: Basket, menu: &MenuSnapshot) -> Self {
        let lines = basket
            .lines(menu)
            .map(|resolved| BasketLineView {
                item_id: resolved.line.item_id,
                name: resolved.item.name.clone(),
                quantity: resolved.line.quantity,
                unit_price: resolved.line.unit_price,
                line_total: resolved.line_total(),
                notes: resolved.line.notes.clone(),
            })
            .collect();

        Self { basket, lines }
    }

    pub fn summary(&self, delivery_type: DeliveryType) -> BasketSummary {
        self.basket.summary(delivery_type)
    }
}

/// Result of a basket operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketUpdate {
    pub basket: BasketView,

    /// Whether the applied promo stopped being valid and was removed.
    pub promo_removed: bool,

    /// Customer-facing explanation when a promo was removed.
    pub warning: Option<String>,
}

/// Result of copying a past order into the basket.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderOutcome {
    pub update: BasketUpdate,

    /// Order lines added to the basket.
    pub added: usize,

    /// Order lines left out because the item is off the menu or unavailable.
    pub skipped: usize,
}
