//! Get Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};

use crate::{
    extensions::*,
    orders::{errors::into_status_error, handlers::parse_reference, models::OrderResponse},
    state::State,
};

/// Get Order Handler
///
/// Full order details, for the customer who placed it or the session that just placed it.
#[endpoint(
    tags("orders"),
    summary = "Get Order",
    responses(
        (status_code = StatusCode::OK, description = "Order"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
    ),
)]
pub(crate) async fn handler(
    reference: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let visitor = depot.visitor_or_500()?;
    let reference = parse_reference(&reference.into_inner())?;

    let order = state
        .app
        .orders
        .get_order(visitor, reference)
        .await
        .map_err(into_status_error)?;

    Ok(Json(OrderResponse::from(&order)))
}
