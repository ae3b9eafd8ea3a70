//! Order Status Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};

use crate::{
    extensions::*,
    orders::{errors::into_status_error, handlers::parse_reference, models::OrderStatusResponse},
    state::State,
};

/// Order Status Handler
///
/// Polled by the order confirmation page. Available to the customer who placed the order
/// and to the session that placed it.
#[endpoint(
    tags("orders"),
    summary = "Order Status",
    responses(
        (status_code = StatusCode::OK, description = "Status and estimate"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
    ),
)]
pub(crate) async fn handler(
    reference: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<OrderStatusResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let visitor = depot.visitor_or_500()?;
    let reference = parse_reference(&reference.into_inner())?;

    let view = state
        .app
        .orders
        .order_status(visitor, reference)
        .await
        .map_err(into_status_error)?;

    Ok(Json(view.into()))
}
