//! Place Order Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::extract::JsonBody,
    prelude::*,
};

use crate::{
    checkout::{
        errors::{CheckoutFailure, into_failure},
        models::CheckoutRequest,
    },
    extensions::*,
    observability::record_order_placed,
    orders::models::OrderResponse,
    state::State,
};

/// Place Order Handler
///
/// Turns the session's basket into an order. On success the basket is emptied and the
/// response points at the order's status page.
#[endpoint(
    tags("checkout"),
    summary = "Place Order",
    responses(
        (status_code = StatusCode::CREATED, description = "Order placed"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CheckoutRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderResponse>, CheckoutFailure> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let visitor = depot.visitor_or_500()?;
    let client = depot.client_address_or_500()?;

    let order = state
        .app
        .checkout
        .place_order(visitor, client, json.into_inner().into())
        .await
        .map_err(into_failure)?;

    record_order_placed(order.delivery_type);

    res.add_header(LOCATION, format!("/orders/{}/status", order.reference), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(OrderResponse::from(&order)))
}
