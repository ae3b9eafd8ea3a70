//! Reorder Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::PathParam},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use tiffin::orders::DeliveryType;

use crate::{
    basket::{into_status_error, models::BasketResponse},
    extensions::*,
    orders::handlers::parse_reference,
    state::State,
};

/// Reorder Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ReorderResponse {
    /// The basket after the order's items were added
    pub basket: BasketResponse,

    /// Order lines added to the basket
    pub added: usize,

    /// Order lines left out because the item is no longer on the menu
    pub skipped: usize,
}

/// Reorder Handler
///
/// Adds the items of one of the signed-in customer's past orders to the basket at today's
/// prices.
#[endpoint(
    tags("orders"),
    summary = "Reorder",
    responses(
        (status_code = StatusCode::OK, description = "Items added to the basket"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Basket temporarily unavailable"),
    ),
)]
pub(crate) async fn handler(
    reference: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<ReorderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let visitor = depot.visitor_or_500()?;
    let reference = parse_reference(&reference.into_inner())?;

    let outcome = state
        .app
        .baskets
        .reorder(visitor, reference)
        .await
        .map_err(into_status_error)?;

    Ok(Json(ReorderResponse {
        basket: BasketResponse::new(&outcome.update, DeliveryType::default()),
        added: outcome.added,
        skipped: outcome.skipped,
    }))
}
