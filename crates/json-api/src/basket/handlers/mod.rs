//! Basket Handlers

use salvo::prelude::Json;
use tiffin::orders::DeliveryType;
use tiffin_app::domain::baskets::models::BasketUpdate;

use crate::{basket::models::BasketResponse, observability::record_promo_removed};

pub(crate) mod add_item;
pub(crate) mod apply_promo;
pub(crate) mod get;
pub(crate) mod remove_item;
pub(crate) mod remove_promo;
pub(crate) mod set_notes;
pub(crate) mod update_item;

fn respond(update: &BasketUpdate, delivery_type: DeliveryType) -> Json<BasketResponse> {
    if update.promo_removed {
        record_promo_removed("basket");
    }

    Json(BasketResponse::new(update, delivery_type))
}
