//! Advance Order Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::{JsonBody, PathParam}},
    prelude::*,
};
use serde::Deserialize;
use tiffin::orders::OrderStatus;

use crate::{
    extensions::*,
    kitchen::errors::into_status_error,
    orders::{models::StatusChangeResponse, parse_reference},
    state::State,
};

/// Advance Order Request
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct AdvanceOrderRequest {
    /// Status the order was in when the staff member pressed the button
    pub from: String,
}

/// Advance Order Handler
///
/// Moves an order one step along the workflow. Repeating a request that was already applied
/// reports the current status with `changed: false`.
#[endpoint(
    tags("kitchen"),
    summary = "Advance Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order advanced"),
        (status_code = StatusCode::BAD_REQUEST, description = "Unknown status"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Order cannot advance from that status"),
    ),
)]
pub(crate) async fn handler(
    reference: PathParam<String>,
    json: JsonBody<AdvanceOrderRequest>,
    depot: &mut Depot,
) -> Result<Json<StatusChangeResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let reference = parse_reference(&reference.into_inner())?;
    let from: OrderStatus = json.into_inner().from.parse().or_400()?;

    let change = state
        .app
        .kitchen
        .advance(reference.clone(), from)
        .await
        .map_err(into_status_error)?;

    Ok(Json(StatusChangeResponse::new(
        reference.as_str(),
        change.status(),
        change.is_changed(),
    )))
}
