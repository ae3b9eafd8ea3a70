//! Errors

use salvo::http::StatusError;
use tiffin::basket::BasketError;
use tracing::error;

use tiffin_app::domain::baskets::BasketsServiceError;

pub(crate) fn into_status_error(error: BasketsServiceError) -> StatusError {
    match error {
        BasketsServiceError::ItemNotFound | BasketsServiceError::Basket(BasketError::Unavailable(_)) => {
            StatusError::not_found().brief("Menu item not found")
        }
        BasketsServiceError::OrderNotFound => StatusError::not_found().brief("Order not found"),
        BasketsServiceError::Basket(
            error @ (BasketError::ZeroQuantity | BasketError::QuantityOutOfRange(_)),
        ) => StatusError::bad_request().brief(error.to_string()),
        BasketsServiceError::Basket(error @ BasketError::CurrencyMismatch(..)) => {
            error!("basket currency mismatch: {error}");

            StatusError::internal_server_error()
        }
        BasketsServiceError::InvalidPromo(reason) => {
            StatusError::unprocessable_entity().brief(reason.to_string())
        }
        BasketsServiceError::RateLimited(limited) => {
            StatusError::too_many_requests().brief(limited.to_string())
        }
        BasketsServiceError::Unavailable(source) => {
            error!("basket unavailable: {source}");

            StatusError::service_unavailable().brief("Basket temporarily unavailable")
        }
    }
}
