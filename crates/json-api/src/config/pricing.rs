//! Pricing Config

use clap::Args;
use tiffin::pricing::{self, PricingError, PricingPolicy};

/// Delivery pricing settings. Amounts are decimal strings in `CURRENCY`.
#[derive(Debug, Args)]
pub struct PricingConfig {
    /// ISO 4217 currency code
    #[arg(long, env = "CURRENCY", default_value = "GBP")]
    pub currency: String,

    /// Delivery fee charged below the free-delivery threshold
    #[arg(long, env = "DELIVERY_FEE", default_value = "2.50")]
    pub delivery_fee: String,

    /// Subtotal from which delivery is free
    #[arg(long, env = "FREE_DELIVERY_THRESHOLD", default_value = "20.00")]
    pub free_delivery_threshold: String,

    /// Minimum subtotal for delivery orders
    #[arg(long, env = "MIN_DELIVERY_ORDER", default_value = "10.00")]
    pub min_delivery_order: String,
}

impl PricingConfig {
    pub(crate) fn policy(&self) -> Result<PricingPolicy, PricingError> {
        let currency = pricing::currency_from_code(&self.currency)?;

        Ok(PricingPolicy {
            currency,
            delivery_fee: pricing::parse_amount(&self.delivery_fee, currency)?,
            free_delivery_threshold: pricing::parse_amount(&self.free_delivery_threshold, currency)?,
            min_delivery_order: pricing::parse_amount(&self.min_delivery_order, currency)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn config(currency: &str, delivery_fee: &str) -> PricingConfig {
        PricingConfig {
            currency: currency.to_string(),
            delivery_fee: delivery_fee.to_string(),
            free_delivery_threshold: "20.00".to_string(),
            min_delivery_order: "10.00".to_string(),
        }
    }

    #[test]
    fn defaults_build_the_reference_policy() -> TestResult {
        assert_eq!(config("GBP", "2.50").policy()?, PricingPolicy::reference());

        Ok(())
    }

    #[test]
    fn bad_amounts_are_rejected() {
        assert!(matches!(
            config("GBP", "two pounds").policy(),
            Err(PricingError::InvalidAmount(_))
        ));
        assert!(matches!(
            config("XYZ", "2.50").policy(),
            Err(PricingError::UnknownCurrency(_))
        ));
    }
}
