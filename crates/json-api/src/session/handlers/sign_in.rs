//! Sign In Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, session::errors::into_status_error, state::State};

/// Sign In Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SignInResponse {
    /// Basket lines restored from the customer's saved basket
    pub restored_lines: usize,
}

/// Sign In Handler
///
/// Merges the basket saved on the customer's profile into this session's basket. Lines
/// already in the session basket are kept as they are.
#[endpoint(
    tags("session"),
    summary = "Restore Saved Basket",
    responses(
        (status_code = StatusCode::OK, description = "Saved basket merged"),
        (status_code = StatusCode::UNAUTHORIZED, description = "No customer"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Basket temporarily unavailable"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<SignInResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let visitor = depot.visitor_or_500()?;
    let customer = depot.customer_or_401()?;

    let restored_lines = state
        .app
        .accounts
        .on_sign_in(visitor.session, customer)
        .await
        .map_err(into_status_error)?;

    Ok(Json(SignInResponse { restored_lines }))
}
