//! Errors

use salvo::http::StatusError;
use tracing::error;

use tiffin_app::domain::kitchen::KitchenServiceError;

pub(crate) fn into_status_error(error: KitchenServiceError) -> StatusError {
    match error {
        KitchenServiceError::NotFound => StatusError::not_found().brief("Order not found"),
        KitchenServiceError::Transition(error) => StatusError::conflict().brief(error.to_string()),
        KitchenServiceError::Unavailable(source) => {
            error!("kitchen orders unavailable: {source}");

            StatusError::service_unavailable().brief("Orders temporarily unavailable")
        }
    }
}
