//! Errors

use salvo::http::StatusError;
use tracing::error;

use tiffin_app::domain::accounts::AccountsServiceError;

pub(crate) fn into_status_error(error: AccountsServiceError) -> StatusError {
    match error {
        AccountsServiceError::Unavailable(source) => {
            error!("session store unavailable: {source}");

            StatusError::service_unavailable().brief("Basket temporarily unavailable")
        }
    }
}
