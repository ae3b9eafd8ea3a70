//! Apply Promo Code Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use tiffin::orders::DeliveryType;

use crate::{
    basket::{errors::into_status_error, handlers::respond, models::BasketResponse},
    extensions::*,
    state::State,
};

/// Apply Promo Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ApplyPromoRequest {
    /// Promo code; case does not matter
    pub code: String,
}

/// Apply Promo Code Handler
///
/// Applies a promo code, replacing any promotion already on the basket. Attempts are rate
/// limited per client.
#[endpoint(
    tags("basket"),
    summary = "Apply Promo Code",
    responses(
        (status_code = StatusCode::OK, description = "Promo applied"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Promo code cannot be used"),
        (status_code = StatusCode::TOO_MANY_REQUESTS, description = "Too many attempts"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Basket temporarily unavailable"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<ApplyPromoRequest>,
    depot: &mut Depot,
) -> Result<Json<BasketResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let visitor = depot.visitor_or_500()?;
    let client = depot.client_address_or_500()?;

    let update = state
        .app
        .baskets
        .apply_promo(visitor, client, json.into_inner().code)
        .await
        .map_err(into_status_error)?;

    Ok(respond(&update, DeliveryType::default()))
}
