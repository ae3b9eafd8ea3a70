//! Sign Out Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, session::errors::into_status_error, state::State};

/// Sign Out Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SignOutResponse {
    /// Whether the basket was saved to the customer's profile
    pub basket_saved: bool,
}

/// Sign Out Handler
///
/// Saves the session basket to the customer's profile and empties the session.
#[endpoint(
    tags("session"),
    summary = "Save Basket and Sign Out",
    responses(
        (status_code = StatusCode::OK, description = "Session emptied"),
        (status_code = StatusCode::UNAUTHORIZED, description = "No customer"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Basket temporarily unavailable"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<SignOutResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let visitor = depot.visitor_or_500()?;
    let customer = depot.customer_or_401()?;

    let basket_saved = state
        .app
        .accounts
        .on_sign_out(visitor.session, customer)
        .await
        .map_err(into_status_error)?;

    Ok(Json(SignOutResponse { basket_saved }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use tiffin_app::domain::accounts::MockAccountsService;

    use crate::test_helpers::{TEST_SESSION_UUID, accounts_service, guest_accounts_service};

    use super::*;

    #[tokio::test]
    async fn test_sign_out_saves_basket() -> TestResult {
        let mut accounts = MockAccountsService::new();

        accounts
            .expect_on_sign_out()
            .once()
            .withf(|session, _| *session == TEST_SESSION_UUID)
            .return_once(|_, _| Ok(true));

        let response: SignOutResponse = TestClient::post("http://example.com/session/sign-out")
            .send(&accounts_service(
                accounts,
                Router::with_path("session/sign-out").post(handler),
            ))
            .await
            .take_json()
            .await?;

        assert!(response.basket_saved);

        Ok(())
    }

    #[tokio::test]
    async fn test_guests_cannot_sign_out() -> TestResult {
        let mut accounts = MockAccountsService::new();

        accounts.expect_on_sign_out().never();

        let res = TestClient::post("http://example.com/session/sign-out")
            .send(&guest_accounts_service(
                accounts,
                Router::with_path("session/sign-out").post(handler),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
