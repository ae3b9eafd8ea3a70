//! Checkout
//!
//! Turns a basket and a submitted checkout form into an [`OrderDraft`]. Everything here is
//! a pure check against the basket and catalog; persisting the order, redeeming the promo
//! and clearing the basket are the caller's job once the draft exists.

use std::fmt;

use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    basket::Basket,
    catalog::{Catalog, ItemId},
    orders::{
        CustomerDetails, DeliveryAddress, DeliveryType, OrderDraft, OrderItem, OrderTotals,
        PaymentMethod,
    },
    pricing::{Price, display_amount},
    promotions::{DiscountRule, InvalidPromo, PromoCheck, RedemptionContext, revalidate},
};

/// Shortest card number accepted by the simulated card payment.
pub const MIN_CARD_DIGITS: usize = 12;

/// Longest card number accepted by the simulated card payment.
pub const MAX_CARD_DIGITS: usize = 19;

/// Simulated card details. Only the last four digits are ever kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CardDetails {
    /// Card number, spaces allowed
    pub number: String,

    /// Expiry, e.g. "08/27"
    pub expiry: String,

    /// Security code
    pub cvv: String,
}

/// The checkout form as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutForm {
    /// Full name
    #[serde(default)]
    pub full_name: String,

    /// Email address
    #[serde(default)]
    pub email: String,

    /// Phone number
    #[serde(default)]
    pub phone: String,

    /// Delivery or collection
    pub delivery_type: DeliveryType,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// First address line; required for delivery
    #[serde(default)]
    pub address_line1: String,

    /// Second address line
    #[serde(default)]
    pub address_line2: String,

    /// Town or city; required for delivery
    #[serde(default)]
    pub city: String,

    /// Postcode; required for delivery
    #[serde(default)]
    pub postcode: String,

    /// Free-text instructions
    #[serde(default)]
    pub special_instructions: String,

    /// Card details; required for card payment
    #[serde(default)]
    pub card: Option<CardDetails>,
}

/// A problem with one form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as submitted
    pub field: &'static str,

    /// Message for the customer
    pub message: &'static str,
}

/// All problems found in a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(SmallVec<[FieldError; 4]>);

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    /// Whether no problems were found.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The problems, in form order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// The message for a field, if it has a problem.
    pub fn message_for(&self, field: &str) -> Option<&'static str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }

            write!(f, "{}: {}", error.field, error.message)?;
        }

        Ok(())
    }
}

/// Errors that stop a checkout.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckoutError {
    /// Nothing to order.
    #[error("your basket is empty")]
    EmptyBasket,

    /// The form has problems; nothing was changed.
    #[error("please correct the highlighted fields: {0}")]
    Validation(ValidationErrors),

    /// Delivery orders have a minimum subtotal.
    #[error(
        "the minimum order for delivery is {}; add {} more",
        display_amount(.minimum),
        display_amount(.shortfall)
    )]
    BelowMinimumOrder {
        /// Minimum subtotal
        minimum: Price,

        /// Amount still needed
        shortfall: Price,
    },

    /// The applied promotion is no longer valid and has been removed from the basket.
    #[error("promo code {code} was removed: {reason}")]
    PromoRemoved {
        /// Removed code
        code: String,

        /// Why it no longer applies
        reason: InvalidPromo,
    },

    /// Items that can no longer be ordered were taken out of the basket.
    #[error("{} item(s) in your basket are no longer available and were removed", .items.len())]
    ItemsWithdrawn {
        /// Removed items
        items: Vec<ItemId>,
    },
}

impl CheckoutError {
    /// Whether the basket was modified and needs saving.
    pub fn basket_changed(&self) -> bool {
        matches!(
            self,
            CheckoutError::PromoRemoved { .. } | CheckoutError::ItemsWithdrawn { .. }
        )
    }
}

/// Checked form contents, ready to go on an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedForm {
    /// Contact details
    pub customer: CustomerDetails,

    /// Delivery address, for delivery orders
    pub address: Option<DeliveryAddress>,

    /// Instructions, if any were given
    pub special_instructions: Option<String>,

    /// Delivery or collection
    pub delivery_type: DeliveryType,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// Last four digits of the simulated card
    pub card_last_four: Option<String>,
}

impl CheckoutForm {
    /// Checks required fields, the delivery address and the simulated card.
    ///
    /// # Errors
    ///
    /// Returns every problem found, not only the first.
    pub fn validate(&self) -> Result<ValidatedForm, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.full_name.trim().is_empty() {
            errors.push("full_name", "This field is required.");
        }

        if !looks_like_email(self.email.trim()) {
            errors.push("email", "Enter a valid email address.");
        }

        if self.phone.trim().is_empty() {
            errors.push("phone", "This field is required.");
        }

        if self.delivery_type == DeliveryType::Delivery {
            if self.address_line1.trim().is_empty() {
                errors.push("address_line1", "Delivery address is required.");
            }
            if self.city.trim().is_empty() {
                errors.push("city", "City is required.");
            }
            if self.postcode.trim().is_empty() {
                errors.push("postcode", "Postcode is required.");
            }
        }

        let mut card_last_four = None;

        if self.payment_method == PaymentMethod::Card {
            let card = self.card.clone().unwrap_or_default();
            let digits: String = card.number.chars().filter(|c| *c != ' ').collect();

            if (MIN_CARD_DIGITS..=MAX_CARD_DIGITS).contains(&digits.len())
                && digits.chars().all(|c| c.is_ascii_digit())
            {
                let mut last_four: Vec<char> = digits.chars().rev().take(4).collect();
                last_four.reverse();
                card_last_four = Some(last_four.into_iter().collect());
            } else {
                errors.push("card_number", "Please enter a valid card number.");
            }

            if card.expiry.trim().is_empty() {
                errors.push("card_expiry", "Please enter the expiry date.");
            }
            if card.cvv.trim().is_empty() {
                errors.push("card_cvv", "Please enter the CVV.");
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let address = (self.delivery_type == DeliveryType::Delivery).then(|| DeliveryAddress {
            line1: self.address_line1.trim().to_string(),
            line2: non_blank(&self.address_line2),
            city: self.city.trim().to_string(),
            postcode: self.postcode.trim().to_uppercase(),
        });

        Ok(ValidatedForm {
            customer: CustomerDetails {
                full_name: self.full_name.trim().to_string(),
                email: self.email.trim().to_string(),
                phone: self.phone.trim().to_string(),
            },
            address,
            special_instructions: non_blank(&self.special_instructions),
            delivery_type: self.delivery_type,
            payment_method: self.payment_method,
            card_last_four,
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Validates a checkout and freezes the basket into an order draft.
///
/// Steps, in order: empty basket, form, withdrawn items, minimum delivery order, promo
/// revalidation against the final subtotal (including the first-order check), then the
/// snapshot of lines and totals.
///
/// `rule` is the stored rule for the basket's promo code, if it has one.
///
/// # Errors
///
/// Returns a [`CheckoutError`]. When [`CheckoutError::basket_changed`] is true the basket
/// was corrected in place (withdrawn items or an invalid promo removed) and should be saved
/// so the customer can review it.
pub fn draft_order<C: Catalog>(
    basket: &mut Basket,
    catalog: &C,
    form: &CheckoutForm,
    rule: Option<&DiscountRule>,
    context: &RedemptionContext,
) -> Result<OrderDraft, CheckoutError> {
    if basket.is_empty() {
        return Err(CheckoutError::EmptyBasket);
    }

    let form = form.validate().map_err(CheckoutError::Validation)?;

    let withdrawn = basket.prune_unorderable(catalog);
    if !withdrawn.is_empty() {
        return Err(CheckoutError::ItemsWithdrawn { items: withdrawn });
    }

    let subtotal = basket.subtotal();

    if let Some(shortfall) = basket
        .policy()
        .minimum_order_shortfall(form.delivery_type, &subtotal)
    {
        return Err(CheckoutError::BelowMinimumOrder {
            minimum: basket.policy().min_delivery_order,
            shortfall,
        });
    }

    if let PromoCheck::Removed { code, reason } = revalidate(basket, rule, context) {
        return Err(CheckoutError::PromoRemoved { code, reason });
    }

    let items = basket
        .lines(catalog)
        .map(|resolved| OrderItem {
            item_id: Some(resolved.line.item_id),
            item_name: resolved.item.name.clone(),
            unit_price: resolved.line.unit_price,
            quantity: resolved.line.quantity,
            notes: resolved.line.notes.clone(),
        })
        .collect();

    let totals = OrderTotals {
        subtotal,
        delivery_charge: basket.delivery_charge(form.delivery_type),
        discount: basket.discount(),
        total: basket.total(form.delivery_type),
    };

    let ValidatedForm {
        customer,
        address,
        special_instructions,
        delivery_type,
        payment_method,
        card_last_four,
    } = form;

    Ok(OrderDraft {
        customer,
        address,
        special_instructions,
        delivery_type,
        payment_method,
        card_last_four,
        items,
        totals,
        promo_code: basket.promo().map(|promo| promo.code.clone()),
    })
}
