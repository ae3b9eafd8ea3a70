//! Get Basket Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};

use crate::{
    basket::{errors::into_status_error, handlers::respond, models::BasketResponse},
    extensions::*,
    orders::models::DeliveryOption,
    state::State,
};

/// Get Basket Handler
///
/// Returns the visitor's basket with any automatic offer applied. Totals are for delivery
/// unless `delivery_type=collection` is given.
#[endpoint(
    tags("basket"),
    summary = "Get Basket",
    responses(
        (status_code = StatusCode::OK, description = "Basket"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Basket temporarily unavailable"),
    ),
)]
pub(crate) async fn handler(
    delivery_type: QueryParam<DeliveryOption, false>,
    depot: &mut Depot,
) -> Result<Json<BasketResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let visitor = depot.visitor_or_500()?;

    let update = state
        .app
        .baskets
        .get_basket(visitor)
        .await
        .map_err(into_status_error)?;

    Ok(respond(
        &update,
        delivery_type.into_inner().unwrap_or_default().into(),
    ))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use tiffin_app::{
        domain::baskets::{BasketsServiceError, MockBasketsService},
        storage::StoreError,
    };

    use crate::test_helpers::{TEST_SESSION_UUID, baskets_service, make_basket_update};

    use super::*;

    fn make_service(baskets: MockBasketsService) -> Service {
        baskets_service(baskets, Router::with_path("basket").get(handler))
    }

    #[tokio::test]
    async fn test_get_returns_delivery_totals() -> TestResult {
        let mut baskets = MockBasketsService::new();

        baskets
            .expect_get_basket()
            .once()
            .withf(|visitor| visitor.session == TEST_SESSION_UUID)
            .return_once(|_| Ok(make_basket_update(1)));

        let response: BasketResponse = TestClient::get("http://example.com/basket")
            .send(&make_service(baskets))
            .await
            .take_json()
            .await?;

        assert_eq!(response.currency, "GBP");
        assert_eq!(response.subtotal, "9.50");
        assert_eq!(response.delivery_charge, "2.50");
        assert_eq!(response.total, "12.00");
        assert_eq!(response.free_delivery_shortfall.as_deref(), Some("10.50"));
        assert_eq!(response.lines.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_collection_totals() -> TestResult {
        let mut baskets = MockBasketsService::new();

        baskets
            .expect_get_basket()
            .once()
            .return_once(|_| Ok(make_basket_update(1)));

        let response: BasketResponse =
            TestClient::get("http://example.com/basket?delivery_type=collection")
                .send(&make_service(baskets))
                .await
                .take_json()
                .await?;

        assert_eq!(response.delivery_type, DeliveryOption::Collection);
        assert_eq!(response.delivery_charge, "0.00");
        assert_eq!(response.total, "9.50");

        Ok(())
    }

    #[tokio::test]
    async fn test_get_unavailable_returns_503() -> TestResult {
        let mut baskets = MockBasketsService::new();

        baskets
            .expect_get_basket()
            .once()
            .return_once(|_| Err(BasketsServiceError::from(StoreError::Unavailable)));

        let res = TestClient::get("http://example.com/basket")
            .send(&make_service(baskets))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::SERVICE_UNAVAILABLE));

        Ok(())
    }
}
