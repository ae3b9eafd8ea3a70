//! Order History Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, models::OrderResponse},
    state::State,
};

/// Order History Handler
///
/// The signed-in customer's orders, newest first.
#[endpoint(
    tags("orders"),
    summary = "Order History",
    responses(
        (status_code = StatusCode::OK, description = "Orders"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Not signed in"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<Vec<OrderResponse>>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let customer = depot.customer_or_401()?;

    let orders = state
        .app
        .orders
        .order_history(customer)
        .await
        .map_err(into_status_error)?;

    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}
