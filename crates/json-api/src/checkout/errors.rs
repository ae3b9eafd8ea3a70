//! Errors
//!
//! Checkout failures carry more than a status line: the form's field errors, whether the
//! basket changed underneath the customer, and where to send them next.

use salvo::{
    Scribe,
    oapi::{self, Components, Content, EndpointOutRegister, Operation, ToSchema},
    prelude::*,
};
use tiffin::{checkout::CheckoutError, pricing::display_amount};
use tracing::{error, info};

use tiffin_app::domain::checkout::CheckoutServiceError;

use crate::{checkout::models::CheckoutErrorResponse, observability::record_promo_removed};

const MENU_PATH: &str = "/menu";

/// A failed checkout, rendered as a [`CheckoutErrorResponse`].
#[derive(Debug)]
pub(crate) struct CheckoutFailure {
    pub status: StatusCode,
    pub body: CheckoutErrorResponse,
}

impl CheckoutFailure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: CheckoutErrorResponse {
                message: message.into(),
                redirect: None,
                fields: Vec::new(),
                basket_changed: false,
            },
        }
    }

    fn redirect(mut self, path: &str) -> Self {
        self.body.redirect = Some(path.to_string());
        self
    }

    fn basket_changed(mut self) -> Self {
        self.body.basket_changed = true;
        self
    }
}

impl From<StatusError> for CheckoutFailure {
    fn from(error: StatusError) -> Self {
        Self::new(error.code, error.brief)
    }
}

impl Scribe for CheckoutFailure {
    fn render(self, res: &mut Response) {
        res.status_code(self.status);
        res.render(Json(self.body));
    }
}

impl EndpointOutRegister for CheckoutFailure {
    fn register(components: &mut Components, operation: &mut Operation) {
        let schema = CheckoutErrorResponse::to_schema(components);

        for (code, description) in [
            ("409", "Basket changed or empty"),
            ("422", "Invalid form or below the delivery minimum"),
            ("429", "Too many checkout attempts"),
            ("503", "Checkout temporarily unavailable"),
        ] {
            operation.responses.insert(
                code,
                oapi::Response::new(description)
                    .add_content("application/json", Content::new(schema.clone())),
            );
        }
    }
}

pub(crate) fn into_failure(error: CheckoutServiceError) -> CheckoutFailure {
    match error {
        CheckoutServiceError::Checkout(error) => from_checkout_error(error),
        CheckoutServiceError::PromoRejected { code, reason } => {
            record_promo_removed("checkout");

            info!(%code, %reason, "promo rejected while placing order");

            CheckoutFailure::new(
                StatusCode::CONFLICT,
                format!("Promo code {code} is no longer valid and has been removed. {reason}"),
            )
            .basket_changed()
        }
        CheckoutServiceError::RateLimited(limited) => {
            CheckoutFailure::new(StatusCode::TOO_MANY_REQUESTS, capitalise(&limited.to_string()))
        }
        CheckoutServiceError::Unavailable(source) => {
            error!("checkout unavailable: {source}");

            CheckoutFailure::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Checkout is temporarily unavailable. Please try again.",
            )
        }
    }
}

fn from_checkout_error(error: CheckoutError) -> CheckoutFailure {
    match error {
        CheckoutError::EmptyBasket => {
            CheckoutFailure::new(StatusCode::CONFLICT, "Your basket is empty.").redirect(MENU_PATH)
        }
        CheckoutError::Validation(errors) => {
            let mut failure = CheckoutFailure::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Please correct the highlighted fields.",
            );
            failure.body.fields = errors.iter().map(Into::into).collect();

            failure
        }
        CheckoutError::BelowMinimumOrder { minimum, shortfall } => CheckoutFailure::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!(
                "The minimum order for delivery is {}. Add {} more to continue.",
                display_amount(&minimum),
                display_amount(&shortfall)
            ),
        ),
        CheckoutError::PromoRemoved { code, reason } => {
            record_promo_removed("checkout");

            CheckoutFailure::new(
                StatusCode::CONFLICT,
                format!("Promo code {code} is no longer valid and has been removed. {reason}"),
            )
            .basket_changed()
        }
        CheckoutError::ItemsWithdrawn { items } => {
            info!(count = items.len(), "withdrawn items removed at checkout");

            CheckoutFailure::new(
                StatusCode::CONFLICT,
                "Some items in your basket are no longer available and have been removed. \
                 Please review your basket.",
            )
            .basket_changed()
        }
    }
}

fn capitalise(message: &str) -> String {
    let mut chars = message.chars();

    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
