//! Basket Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use tiffin::{orders::DeliveryType, pricing::format_amount};

use tiffin_app::domain::baskets::models::{BasketLineView, BasketUpdate};

use crate::orders::models::DeliveryOption;

/// Basket Response
///
/// Amounts are decimal strings in `currency`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BasketResponse {
    /// ISO currency code
    pub currency: String,

    /// Basket lines
    pub lines: Vec<BasketLineResponse>,

    /// Units across all lines
    pub total_quantity: u32,

    /// Delivery type the totals are for
    pub delivery_type: DeliveryOption,

    pub subtotal: String,
    pub delivery_charge: String,
    pub discount: String,
    pub total: String,

    /// Applied promotion
    pub promo: Option<PromoResponse>,

    /// Amount still needed for free delivery
    pub free_delivery_shortfall: Option<String>,

    /// Whether a promotion was removed because it stopped applying
    pub promo_removed: bool,

    /// Why the promotion was removed
    pub warning: Option<String>,
}

/// Basket Line Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BasketLineResponse {
    pub item_id: u64,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,

    /// Kitchen notes
    pub notes: Option<String>,
}

/// Promo Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct PromoResponse {
    pub code: String,
    pub discount: String,
}

impl BasketResponse {
    pub(crate) fn new(update: &BasketUpdate, delivery_type: DeliveryType) -> Self {
        let summary = update.basket.summary(delivery_type);

        Self {
            currency: update.basket.basket.currency().iso_alpha_code.to_string(),
            lines: update
                .basket
                .lines
                .iter()
                .map(BasketLineResponse::from)
                .collect(),
            total_quantity: summary.total_quantity,
            delivery_type: delivery_type.into(),
            subtotal: format_amount(&summary.subtotal),
            delivery_charge: format_amount(&summary.delivery_charge),
            discount: format_amount(&summary.discount),
            total: format_amount(&summary.total),
            promo: summary.promo.map(|promo| PromoResponse {
                discount: format_amount(&promo.discount),
                code: promo.code,
            }),
            free_delivery_shortfall: summary
                .free_delivery_shortfall
                .as_ref()
                .map(format_amount),
            promo_removed: update.promo_removed,
            warning: update.warning.clone(),
        }
    }
}

impl From<&BasketLineView> for BasketLineResponse {
    fn from(line: &BasketLineView) -> Self {
        Self {
            item_id: line.item_id.0,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: format_amount(&line.unit_price),
            line_total: format_amount(&line.line_total),
            notes: line.notes.clone(),
        }
    }
}
