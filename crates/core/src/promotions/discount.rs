//! Discount amounts

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

use crate::pricing::{Price, display_amount};

/// Errors raised when defining a discount.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiscountError {
    /// Percentage discounts must be greater than 0 and at most 100.
    #[error("percentage {0} must be greater than 0 and at most 100")]
    PercentOutOfRange(Decimal),

    /// Fixed discounts must be positive.
    #[error("fixed discount must be positive")]
    NonPositiveAmount,

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// How a promotion reduces the subtotal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscountKind {
    /// A share of the subtotal (e.g. "10% off").
    Percentage(Percentage),

    /// A flat amount (e.g. "£5 off").
    Fixed(Price),
}

impl DiscountKind {
    /// A percentage discount, given as a number of percent (`10` for 10%).
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::PercentOutOfRange`] unless `0 < percent <= 100`.
    pub fn percent_off(percent: Decimal) -> Result<Self, DiscountError> {
        if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(DiscountError::PercentOutOfRange(percent));
        }

        Ok(DiscountKind::Percentage(Percentage::from(
            percent / Decimal::ONE_HUNDRED,
        )))
    }

    /// A fixed discount.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::NonPositiveAmount`] for zero or negative amounts.
    pub fn amount_off(amount: Price) -> Result<Self, DiscountError> {
        if amount.to_minor_units() <= 0 {
            return Err(DiscountError::NonPositiveAmount);
        }

        Ok(DiscountKind::Fixed(amount))
    }

    /// The number of percent taken off, for percentage discounts.
    pub fn percent(&self) -> Option<Decimal> {
        match self {
            DiscountKind::Percentage(percent) => {
                Some(((*percent) * Decimal::ONE_HUNDRED).normalize())
            }
            DiscountKind::Fixed(_) => None,
        }
    }

    /// Short description, e.g. "10% off" or "£5.00 off".
    pub fn describe(&self) -> String {
        match self {
            DiscountKind::Percentage(percent) => {
                let hundredths = ((*percent) * Decimal::ONE_HUNDRED).normalize();

                format!("{hundredths}% off")
            }
            DiscountKind::Fixed(amount) => format!("{} off", display_amount(amount)),
        }
    }
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// Halves round away from zero.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    // Percentage only exposes its value through multiplication.
    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}
