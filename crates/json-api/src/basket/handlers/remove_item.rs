//! Remove Basket Item Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use tiffin::{catalog::ItemId, orders::DeliveryType};

use crate::{
    basket::{errors::into_status_error, handlers::respond, models::BasketResponse},
    extensions::*,
    state::State,
};

/// Remove Basket Item Handler
///
/// Removing an item that is not in the basket leaves the basket unchanged.
#[endpoint(
    tags("basket"),
    summary = "Remove Item from Basket",
    responses(
        (status_code = StatusCode::OK, description = "Item removed"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Basket temporarily unavailable"),
    ),
)]
pub(crate) async fn handler(
    item: PathParam<u64>,
    depot: &mut Depot,
) -> Result<Json<BasketResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let visitor = depot.visitor_or_500()?;

    let update = state
        .app
        .baskets
        .remove_item(visitor, ItemId(item.into_inner()))
        .await
        .map_err(into_status_error)?;

    Ok(respond(&update, DeliveryType::default()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use tiffin_app::domain::baskets::MockBasketsService;

    use crate::test_helpers::{baskets_service, make_promo_removed_update};

    use super::*;

    #[tokio::test]
    async fn test_remove_reports_promo_removal() -> TestResult {
        let mut baskets = MockBasketsService::new();

        baskets
            .expect_remove_item()
            .once()
            .withf(|_, item| *item == ItemId(2))
            .return_once(|_, _| Ok(make_promo_removed_update()));

        let response: BasketResponse = TestClient::delete("http://example.com/basket/items/2")
            .send(&baskets_service(
                baskets,
                Router::with_path("basket/items/{item}").delete(handler),
            ))
            .await
            .take_json()
            .await?;

        assert!(response.promo_removed);
        assert!(response.promo.is_none());
        assert!(response.warning.is_some());

        Ok(())
    }
}
