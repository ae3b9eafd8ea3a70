//! Set Basket Item Notes Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use tiffin::{catalog::ItemId, orders::DeliveryType};

use crate::{
    basket::{errors::into_status_error, handlers::respond, models::BasketResponse},
    extensions::*,
    state::State,
};

/// Set Notes Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SetNotesRequest {
    /// Kitchen notes, e.g. "extra spicy"; empty clears them
    #[serde(default)]
    pub notes: String,
}

/// Set Basket Item Notes Handler
#[endpoint(
    tags("basket"),
    summary = "Set Kitchen Notes",
    responses(
        (status_code = StatusCode::OK, description = "Notes saved"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Basket temporarily unavailable"),
    ),
)]
pub(crate) async fn handler(
    item: PathParam<u64>,
    json: JsonBody<SetNotesRequest>,
    depot: &mut Depot,
) -> Result<Json<BasketResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let visitor = depot.visitor_or_500()?;

    let update = state
        .app
        .baskets
        .set_notes(visitor, ItemId(item.into_inner()), json.into_inner().notes)
        .await
        .map_err(into_status_error)?;

    Ok(respond(&update, DeliveryType::default()))
}

#[cfg(test)]
mod tests {
    use salvo::test::TestClient;
    use serde_json::json;
    use testresult::TestResult;

    use tiffin_app::domain::baskets::MockBasketsService;

    use crate::test_helpers::{baskets_service, make_basket_update};

    use super::*;

    #[tokio::test]
    async fn test_set_notes_forwards_text() -> TestResult {
        let mut baskets = MockBasketsService::new();

        baskets
            .expect_set_notes()
            .once()
            .withf(|_, item, notes| *item == ItemId(1) && notes == "extra spicy")
            .return_once(|_, _, _| Ok(make_basket_update(1)));

        let res = TestClient::put("http://example.com/basket/items/1/notes")
            .json(&json!({"notes": "extra spicy"}))
            .send(&baskets_service(
                baskets,
                Router::with_path("basket/items/{item}/notes").put(handler),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }
}
