//! Add Basket Item Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use tiffin::{catalog::ItemId, orders::DeliveryType};

use crate::{
    basket::{errors::into_status_error, handlers::respond, models::BasketResponse},
    extensions::*,
    state::State,
};

/// Add Basket Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddItemRequest {
    /// Menu item
    pub item_id: u64,

    /// Units to add
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

/// Add Basket Item Handler
///
/// Adds units of a menu item at its current price.
#[endpoint(
    tags("basket"),
    summary = "Add Item to Basket",
    responses(
        (status_code = StatusCode::OK, description = "Item added"),
        (status_code = StatusCode::NOT_FOUND, description = "Menu item not found or unavailable"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid quantity"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Basket temporarily unavailable"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<AddItemRequest>,
    depot: &mut Depot,
) -> Result<Json<BasketResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let visitor = depot.visitor_or_500()?;
    let request = json.into_inner();

    let update = state
        .app
        .baskets
        .add_item(visitor, ItemId(request.item_id), request.quantity)
        .await
        .map_err(into_status_error)?;

    Ok(respond(&update, DeliveryType::default()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;
    use tiffin::basket::BasketError;

    use tiffin_app::domain::baskets::{BasketsServiceError, MockBasketsService};

    use crate::test_helpers::{baskets_service, make_basket_update};

    use super::*;

    fn make_service(baskets: MockBasketsService) -> Service {
        baskets_service(baskets, Router::with_path("basket/items").post(handler))
    }

    #[tokio::test]
    async fn test_add_item_returns_basket() -> TestResult {
        let mut baskets = MockBasketsService::new();

        baskets
            .expect_add_item()
            .once()
            .withf(|_, item, quantity| *item == ItemId(1) && *quantity == 2)
            .return_once(|_, _, _| Ok(make_basket_update(2)));

        let response: BasketResponse = TestClient::post("http://example.com/basket/items")
            .json(&json!({"item_id": 1, "quantity": 2}))
            .send(&make_service(baskets))
            .await
            .take_json()
            .await?;

        assert_eq!(response.total_quantity, 2);
        assert_eq!(response.subtotal, "19.00");

        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_defaults_to_one() -> TestResult {
        let mut baskets = MockBasketsService::new();

        baskets
            .expect_add_item()
            .once()
            .withf(|_, _, quantity| *quantity == 1)
            .return_once(|_, _, _| Ok(make_basket_update(1)));

        let res = TestClient::post("http://example.com/basket/items")
            .json(&json!({"item_id": 1}))
            .send(&make_service(baskets))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_unknown_item_returns_404() -> TestResult {
        let mut baskets = MockBasketsService::new();

        baskets
            .expect_add_item()
            .once()
            .return_once(|_, _, _| Err(BasketsServiceError::ItemNotFound));

        let res = TestClient::post("http://example.com/basket/items")
            .json(&json!({"item_id": 99, "quantity": 1}))
            .send(&make_service(baskets))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_zero_returns_400() -> TestResult {
        let mut baskets = MockBasketsService::new();

        baskets
            .expect_add_item()
            .once()
            .return_once(|_, _, _| Err(BasketError::ZeroQuantity.into()));

        let res = TestClient::post("http://example.com/basket/items")
            .json(&json!({"item_id": 1, "quantity": 0}))
            .send(&make_service(baskets))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
