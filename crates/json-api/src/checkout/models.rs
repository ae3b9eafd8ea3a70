//! Checkout Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use tiffin::checkout::{CardDetails, CheckoutForm, FieldError};

use crate::orders::models::{DeliveryOption, PaymentOption};

/// Checkout Request
///
/// Address fields are only needed for delivery, card fields only for card payment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub delivery_type: DeliveryOption,
    pub payment_method: PaymentOption,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub special_instructions: String,
    #[serde(default)]
    pub card: Option<CardRequest>,
}

/// Simulated card details; only the last four digits are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub(crate) struct CardRequest {
    pub number: String,

    /// e.g. "08/27"
    pub expiry: String,
    pub cvv: String,
}

impl From<CheckoutRequest> for CheckoutForm {
    fn from(request: CheckoutRequest) -> Self {
        CheckoutForm {
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
            delivery_type: request.delivery_type.into(),
            payment_method: request.payment_method.into(),
            address_line1: request.address_line1,
            address_line2: request.address_line2,
            city: request.city,
            postcode: request.postcode,
            special_instructions: request.special_instructions,
            card: request.card.map(|card| CardDetails {
                number: card.number,
                expiry: card.expiry,
                cvv: card.cvv,
            }),
        }
    }
}

/// Checkout Error Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutErrorResponse {
    /// Message for the customer
    pub message: String,

    /// Where to send the customer instead of retrying, if anywhere
    pub redirect: Option<String>,

    /// Per-field problems with the form
    pub fields: Vec<FieldErrorResponse>,

    /// Whether the basket was changed and should be fetched again
    pub basket_changed: bool,
}

/// Field Error Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct FieldErrorResponse {
    pub field: String,
    pub message: String,
}

impl From<&FieldError> for FieldErrorResponse {
    fn from(error: &FieldError) -> Self {
        Self {
            field: error.field.to_string(),
            message: error.message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;
    use tiffin::orders::{DeliveryType, PaymentMethod};

    use super::*;

    #[test]
    fn requests_default_to_delivery() -> TestResult {
        let request: CheckoutRequest = serde_json::from_value(json!({
            "full_name": "Asha Patel",
            "payment_method": "cash_on_delivery",
        }))?;

        let form = CheckoutForm::from(request);

        assert_eq!(form.delivery_type, DeliveryType::Delivery);
        assert_eq!(form.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(form.card, None);

        Ok(())
    }

    #[test]
    fn card_details_are_carried_over() -> TestResult {
        let request: CheckoutRequest = serde_json::from_value(json!({
            "delivery_type": "collection",
            "payment_method": "card",
            "card": {"number": "4242 4242 4242 4242", "expiry": "08/27", "cvv": "123"},
        }))?;

        let form = CheckoutForm::from(request);

        assert_eq!(form.delivery_type, DeliveryType::Collection);
        assert_eq!(
            form.card.map(|card| card.number),
            Some("4242 4242 4242 4242".to_string())
        );

        Ok(())
    }
}
