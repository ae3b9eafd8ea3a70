//! Cancel Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};

use crate::{
    extensions::*,
    kitchen::errors::into_status_error,
    orders::{models::StatusChangeResponse, parse_reference},
    state::State,
};

/// Cancel Order Handler
#[endpoint(
    tags("kitchen"),
    summary = "Cancel Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order cancelled"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::CONFLICT, description = "Completed orders cannot be cancelled"),
    ),
)]
pub(crate) async fn handler(
    reference: PathParam<String>,
    depot: &mut Depot,
) -> Result<Json<StatusChangeResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let reference = parse_reference(&reference.into_inner())?;

    let change = state
        .app
        .kitchen
        .cancel(reference.clone())
        .await
        .map_err(into_status_error)?;

    Ok(Json(StatusChangeResponse::new(
        reference.as_str(),
        change.status(),
        change.is_changed(),
    )))
}
