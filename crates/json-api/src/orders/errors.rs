//! Errors

use salvo::http::StatusError;
use tracing::error;

use tiffin_app::domain::orders::OrdersServiceError;

pub(crate) fn into_status_error(error: OrdersServiceError) -> StatusError {
    match error {
        OrdersServiceError::NotFound => StatusError::not_found().brief("Order not found"),
        OrdersServiceError::Unavailable => {
            error!("orders unavailable");

            StatusError::service_unavailable().brief("Orders temporarily unavailable")
        }
    }
}
