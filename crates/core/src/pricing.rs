//! Pricing
//!
//! Money helpers and the restaurant's delivery pricing policy. All arithmetic happens in
//! minor units; amounts only become decimal text at the session and API boundaries.

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Findable, Money,
    iso::{self, Currency},
};
use thiserror::Error;

use crate::orders::DeliveryType;

/// Money in the restaurant's currency.
pub type Price = Money<'static, Currency>;

/// Errors raised while parsing or converting amounts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// The amount could not be parsed as a decimal number.
    #[error("could not parse amount \"{0}\"")]
    InvalidAmount(String),

    /// The amount has more decimal places than the currency's minor unit.
    #[error("amount \"{0}\" is more precise than the currency allows")]
    ExcessPrecision(String),

    /// The amount is negative where only non-negative amounts make sense.
    #[error("amount \"{0}\" must not be negative")]
    Negative(String),

    /// The amount is larger than any single price or discount may be.
    #[error("amount \"{0}\" is larger than {MAX_AMOUNT_MINOR} minor units")]
    TooLarge(String),

    /// The ISO currency code is not known.
    #[error("unknown currency code \"{0}\"")]
    UnknownCurrency(String),
}

/// Largest amount, in minor units, accepted from configuration, seed data or sessions.
///
/// Keeps line totals and subtotals of capped baskets well inside `i64`.
pub const MAX_AMOUNT_MINOR: i64 = 100_000_000;

/// Look up an ISO currency by its alphabetic code (e.g. `GBP`).
///
/// # Errors
///
/// Returns [`PricingError::UnknownCurrency`] if the code is not an ISO currency.
pub fn currency_from_code(code: &str) -> Result<&'static Currency, PricingError> {
    Currency::find(code.trim()).ok_or_else(|| PricingError::UnknownCurrency(code.to_string()))
}

/// A zero amount in the given currency.
pub fn zero(currency: &'static Currency) -> Price {
    Money::from_minor(0, currency)
}

/// Parse a decimal string (e.g. `"9.50"`) into money.
///
/// The amount must be non-negative and exact to the currency's minor unit; `"9.505"` is
/// rejected rather than silently rounded.
///
/// # Errors
///
/// - [`PricingError::InvalidAmount`]: the text is not a decimal number, or overflows.
/// - [`PricingError::ExcessPrecision`]: the amount has sub-minor-unit precision.
/// - [`PricingError::Negative`]: the amount is below zero.
/// - [`PricingError::TooLarge`]: the amount is above [`MAX_AMOUNT_MINOR`].
pub fn parse_amount(s: &str, currency: &'static Currency) -> Result<Price, PricingError> {
    let amount = s
        .trim()
        .parse::<Decimal>()
        .map_err(|_err| PricingError::InvalidAmount(s.to_string()))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(PricingError::Negative(s.to_string()));
    }

    let scaled = amount
        .checked_mul(minor_unit_scale(currency))
        .ok_or_else(|| PricingError::InvalidAmount(s.to_string()))?;

    if !scaled.fract().is_zero() {
        return Err(PricingError::ExcessPrecision(s.to_string()));
    }

    let minor_units = scaled
        .to_i64()
        .ok_or_else(|| PricingError::InvalidAmount(s.to_string()))?;

    if minor_units > MAX_AMOUNT_MINOR {
        return Err(PricingError::TooLarge(s.to_string()));
    }

    Ok(Money::from_minor(minor_units, currency))
}

/// Render money as plain decimal text in the currency's precision (e.g. `"9.50"`).
pub fn format_amount(price: &Price) -> String {
    Decimal::new(price.to_minor_units(), price.currency().exponent).to_string()
}

/// Render money for customers, prefixed with the currency symbol (e.g. `"£9.50"`).
pub fn display_amount(price: &Price) -> String {
    format!("{}{}", price.currency().symbol, format_amount(price))
}

fn minor_unit_scale(currency: &Currency) -> Decimal {
    Decimal::from(10_u64.pow(currency.exponent))
}

/// Delivery pricing for the restaurant.
///
/// This is the one place the free-delivery rule is evaluated; baskets, checkout and order
/// confirmation all ask the policy rather than recomputing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingPolicy {
    /// Currency every price is expressed in.
    pub currency: &'static Currency,

    /// Flat delivery fee charged below the free-delivery threshold.
    pub delivery_fee: Price,

    /// Subtotal at or above which delivery is free.
    pub free_delivery_threshold: Price,

    /// Minimum subtotal accepted for delivery orders.
    pub min_delivery_order: Price,
}

impl PricingPolicy {
    /// Reference policy: £2.50 delivery, free from £20.00, £10.00 minimum for delivery.
    pub fn reference() -> Self {
        Self {
            currency: iso::GBP,
            delivery_fee: Money::from_minor(2_50, iso::GBP),
            free_delivery_threshold: Money::from_minor(20_00, iso::GBP),
            min_delivery_order: Money::from_minor(10_00, iso::GBP),
        }
    }

    /// Delivery charge for a subtotal.
    ///
    /// Collection is always free; delivery is free once the subtotal reaches the threshold.
    pub fn delivery_charge(&self, delivery_type: DeliveryType, subtotal: &Price) -> Price {
        match delivery_type {
            DeliveryType::Collection => zero(self.currency),
            DeliveryType::Delivery
                if subtotal.to_minor_units() >= self.free_delivery_threshold.to_minor_units() =>
            {
                zero(self.currency)
            }
            DeliveryType::Delivery => self.delivery_fee,
        }
    }

    /// How much more needs adding for free delivery, if anything.
    pub fn free_delivery_shortfall(&self, subtotal: &Price) -> Option<Price> {
        shortfall(&self.free_delivery_threshold, subtotal)
    }

    /// How far a subtotal falls short of the minimum order, if at all.
    ///
    /// Only delivery orders have a minimum.
    pub fn minimum_order_shortfall(
        &self,
        delivery_type: DeliveryType,
        subtotal: &Price,
    ) -> Option<Price> {
        match delivery_type {
            DeliveryType::Delivery => shortfall(&self.min_delivery_order, subtotal),
            DeliveryType::Collection => None,
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self::reference()
    }
}

fn shortfall(target: &Price, subtotal: &Price) -> Option<Price> {
    let missing = target.to_minor_units() - subtotal.to_minor_units();

    (missing > 0).then(|| Money::from_minor(missing, target.currency()))
}
