//! Remove Promo Code Handler

use std::sync::Arc;

use salvo::prelude::*;
use tiffin::orders::DeliveryType;

use crate::{
    basket::{errors::into_status_error, handlers::respond, models::BasketResponse},
    extensions::*,
    state::State,
};

/// Remove Promo Code Handler
///
/// An automatic offer the basket qualifies for is applied again straight away.
#[endpoint(
    tags("basket"),
    summary = "Remove Promo Code",
    responses(
        (status_code = StatusCode::OK, description = "Promo removed"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Basket temporarily unavailable"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<BasketResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let visitor = depot.visitor_or_500()?;

    let update = state
        .app
        .baskets
        .remove_promo(visitor)
        .await
        .map_err(into_status_error)?;

    Ok(respond(&update, DeliveryType::default()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use tiffin_app::domain::baskets::MockBasketsService;

    use crate::test_helpers::{guest_baskets_service, make_basket_update};

    use super::*;

    #[tokio::test]
    async fn test_remove_promo_returns_basket() -> TestResult {
        let mut baskets = MockBasketsService::new();

        baskets
            .expect_remove_promo()
            .once()
            .withf(|visitor| visitor.customer.is_none())
            .return_once(|_| Ok(make_basket_update(1)));

        let response: BasketResponse = TestClient::delete("http://example.com/basket/promo")
            .send(&guest_baskets_service(
                baskets,
                Router::with_path("basket/promo").delete(handler),
            ))
            .await
            .take_json()
            .await?;

        assert!(response.promo.is_none());
        assert_eq!(response.discount, "0.00");

        Ok(())
    }
}
