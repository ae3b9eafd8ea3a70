//! Active Orders Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    extensions::*, kitchen::errors::into_status_error, orders::models::OrderResponse,
    state::State,
};

/// Active Orders Handler
///
/// Orders the kitchen still has to deal with, oldest first.
#[endpoint(
    tags("kitchen"),
    summary = "Active Orders",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Active orders"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Missing or invalid kitchen token"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<Vec<OrderResponse>>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let orders = state
        .app
        .kitchen
        .active_orders()
        .await
        .map_err(into_status_error)?;

    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}
