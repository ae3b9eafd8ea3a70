//! Promotions
//!
//! Discount rules come in two flavours: codes a customer types in, and offers the basket
//! applies by itself. Both are validated the same way and both live in the basket as an
//! [`AppliedPromo`](crate::basket::AppliedPromo) once accepted.

use std::cmp::Ordering;

use jiff::Timestamp;
use thiserror::Error;

use crate::{
    basket::Basket,
    pricing::{Price, display_amount},
};

pub mod discount;

pub use discount::{DiscountError, DiscountKind, percent_of_minor};

/// Why a promotion cannot be used.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidPromo {
    /// No rule has the code.
    #[error("That promo code is not recognised.")]
    Unknown,

    /// The rule has been switched off.
    #[error("This promo code is no longer active.")]
    Inactive,

    /// The validity window has not started.
    #[error("This promo code is not yet valid.")]
    NotYetValid,

    /// The validity window has ended.
    #[error("This promo code has expired.")]
    Expired,

    /// The usage cap has been reached.
    #[error("This promo code has been fully redeemed.")]
    Exhausted,

    /// The subtotal is below the rule's minimum order.
    #[error("This code requires a minimum order of {}.", display_amount(.minimum))]
    BelowMinimum {
        /// Minimum subtotal
        minimum: Price,
    },

    /// The rule is for first orders and the customer has ordered before.
    #[error("This offer is only available on your first order.")]
    NotFirstOrder,
}

/// How a rule reaches a basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleScope {
    /// The customer enters the code.
    #[default]
    CodeRedeemed,

    /// The basket applies the rule when it qualifies.
    AutoApplied,
}

/// What is known about the customer's order history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerHistory {
    /// Not signed in; history unknown.
    Guest,

    /// Signed in, never ordered.
    NoOrders,

    /// Signed in, has ordered before.
    HasOrders,
}

/// Circumstances a promotion is being redeemed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionContext {
    /// Current time
    pub now: Timestamp,

    /// The customer's order history
    pub customer: CustomerHistory,
}

impl RedemptionContext {
    /// Context for a visitor who is not signed in.
    pub fn guest(now: Timestamp) -> Self {
        Self {
            now,
            customer: CustomerHistory::Guest,
        }
    }
}

/// A promotional rule.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountRule {
    /// Upper-case code
    pub code: String,

    /// Customer-facing description
    pub description: String,

    /// Short badge text for auto-applied offers, e.g. "First order"
    pub badge: Option<String>,

    /// Discount amount
    pub kind: DiscountKind,

    /// Minimum subtotal
    pub min_order: Option<Price>,

    /// Usage cap; `None` is unlimited
    pub max_uses: Option<u32>,

    /// Redemptions so far
    pub uses_count: u32,

    /// Whether the rule is switched on
    pub active: bool,

    /// Start of the validity window
    pub valid_from: Option<Timestamp>,

    /// End of the validity window
    pub valid_until: Option<Timestamp>,

    /// Code-redeemed or auto-applied
    pub scope: RuleScope,

    /// Only for customers without previous orders
    pub first_order_only: bool,
}

impl DiscountRule {
    /// An active, unlimited, always-valid rule with the given code and discount.
    pub fn new(code: &str, kind: DiscountKind) -> Self {
        Self {
            code: code.trim().to_uppercase(),
            description: String::new(),
            badge: None,
            kind,
            min_order: None,
            max_uses: None,
            uses_count: 0,
            active: true,
            valid_from: None,
            valid_until: None,
            scope: RuleScope::CodeRedeemed,
            first_order_only: false,
        }
    }

    /// Whether the rule applies itself to qualifying baskets.
    pub fn is_auto_applied(&self) -> bool {
        self.scope == RuleScope::AutoApplied
    }

    /// Whether the usage cap has been reached. A cap of zero means unlimited.
    pub fn is_exhausted(&self) -> bool {
        self.max_uses
            .is_some_and(|max| max > 0 && self.uses_count >= max)
    }

    /// Checks the rule against a subtotal.
    ///
    /// Checks run in a fixed order and the first failure is reported: active flag, start of
    /// the window, end of the window, usage cap, minimum order, first-order restriction.
    ///
    /// # Errors
    ///
    /// Returns the [`InvalidPromo`] reason for the first failed check.
    pub fn is_valid(&self, subtotal: &Price, context: &RedemptionContext) -> Result<(), InvalidPromo> {
        if !self.active {
            return Err(InvalidPromo::Inactive);
        }

        if self.valid_from.is_some_and(|from| context.now < from) {
            return Err(InvalidPromo::NotYetValid);
        }

        if self.valid_until.is_some_and(|until| context.now > until) {
            return Err(InvalidPromo::Expired);
        }

        if self.is_exhausted() {
            return Err(InvalidPromo::Exhausted);
        }

        if let Some(minimum) = self
            .min_order
            .filter(|minimum| subtotal.to_minor_units() < minimum.to_minor_units())
        {
            return Err(InvalidPromo::BelowMinimum { minimum });
        }

        if self.first_order_only && context.customer != CustomerHistory::NoOrders {
            return Err(InvalidPromo::NotFirstOrder);
        }

        Ok(())
    }

    /// Discount for a subtotal, never negative and never more than the subtotal.
    pub fn get_discount(&self, subtotal: &Price) -> Price {
        let subtotal_minor = subtotal.to_minor_units().max(0);

        let discount = match &self.kind {
            DiscountKind::Percentage(percent) => {
                percent_of_minor(percent, subtotal_minor).unwrap_or(subtotal_minor)
            }
            DiscountKind::Fixed(amount) => amount.to_minor_units(),
        };

        Price::from_minor(discount.clamp(0, subtotal_minor), subtotal.currency())
    }

    /// Validates the rule against the basket and applies it, replacing any current promo.
    ///
    /// # Errors
    ///
    /// Returns the [`InvalidPromo`] reason if the rule does not apply; the basket is untouched.
    pub fn apply_to(
        &self,
        basket: &mut Basket,
        context: &RedemptionContext,
    ) -> Result<Price, InvalidPromo> {
        let subtotal = basket.subtotal();

        self.is_valid(&subtotal, context)?;

        let discount = self.get_discount(&subtotal);

        // Rules are priced in the restaurant currency; a mismatch means the rule cannot apply.
        basket
            .apply_promo(&self.code, discount)
            .map_err(|_err| InvalidPromo::Inactive)?;

        Ok(discount)
    }
}

/// Result of rechecking a basket's promotion after a change.
#[derive(Debug, Clone, PartialEq)]
pub enum PromoCheck {
    /// The basket has no promotion.
    NoPromo,

    /// The promotion still applies; the discount was recomputed.
    Kept {
        /// Promo code
        code: String,

        /// Recomputed discount
        discount: Price,
    },

    /// The promotion no longer applies and was removed from the basket.
    Removed {
        /// Promo code
        code: String,

        /// Why it was removed
        reason: InvalidPromo,
    },
}

impl PromoCheck {
    /// Whether the promotion was removed.
    pub fn was_removed(&self) -> bool {
        matches!(self, PromoCheck::Removed { .. })
    }

    /// Warning for the customer, if the promotion was removed.
    pub fn warning(&self) -> Option<String> {
        match self {
            PromoCheck::Removed { code, reason } => {
                Some(format!("Promo code {code} was removed: {reason}"))
            }
            _ => None,
        }
    }
}

/// Rechecks the basket's promotion against its current subtotal.
///
/// `rule` is the stored rule for the applied code; `None` means it has been deleted, which
/// removes the promotion as inactive. A valid promotion has its discount recomputed so that
/// percentage discounts follow the subtotal.
pub fn revalidate(
    basket: &mut Basket,
    rule: Option<&DiscountRule>,
    context: &RedemptionContext,
) -> PromoCheck {
    let Some(code) = basket.promo().map(|promo| promo.code.clone()) else {
        return PromoCheck::NoPromo;
    };

    let subtotal = basket.subtotal();

    let rule = match rule {
        Some(rule) if rule.code == code => rule,
        _ => {
            basket.remove_promo();

            return PromoCheck::Removed {
                code,
                reason: InvalidPromo::Inactive,
            };
        }
    };

    match rule.is_valid(&subtotal, context) {
        Ok(()) => {
            let discount = rule.get_discount(&subtotal);
            basket.set_promo_discount(discount);

            PromoCheck::Kept { code, discount }
        }
        Err(reason) => {
            basket.remove_promo();

            PromoCheck::Removed { code, reason }
        }
    }
}

/// The auto-applied rule worth the most for a subtotal.
///
/// Only valid rules with a positive discount are considered; ties go to the alphabetically
/// earliest code.
pub fn best_auto_offer<'a>(
    rules: impl IntoIterator<Item = &'a DiscountRule>,
    subtotal: &Price,
    context: &RedemptionContext,
) -> Option<(&'a DiscountRule, Price)> {
    rules
        .into_iter()
        .filter(|rule| rule.is_auto_applied())
        .filter(|rule| rule.is_valid(subtotal, context).is_ok())
        .map(|rule| (rule, rule.get_discount(subtotal)))
        .filter(|(_, discount)| discount.to_minor_units() > 0)
        .min_by(|(a, a_discount), (b, b_discount)| {
            match b_discount.to_minor_units().cmp(&a_discount.to_minor_units()) {
                Ordering::Equal => a.code.cmp(&b.code),
                larger_first => larger_first,
            }
        })
}
