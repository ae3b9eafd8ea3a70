//! Rate Limit Config

use clap::Args;
use jiff::SignedDuration;
use tiffin_app::rate_limit::RateLimits;

/// Rate limit settings, counted per client address.
#[derive(Debug, Args)]
pub struct RateLimitConfig {
    /// Promo code attempts allowed per window
    #[arg(long, env = "PROMO_RATE_LIMIT", default_value_t = 10_u32)]
    pub promo_rate_limit: u32,

    /// Checkout attempts allowed per window
    #[arg(long, env = "CHECKOUT_RATE_LIMIT", default_value_t = 5_u32)]
    pub checkout_rate_limit: u32,

    /// Window length in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECONDS", default_value_t = 60_i64)]
    pub rate_limit_window_seconds: i64,
}

impl RateLimitConfig {
    pub(crate) fn limits(&self) -> RateLimits {
        RateLimits {
            apply_promo: self.promo_rate_limit,
            checkout: self.checkout_rate_limit,
            window: SignedDuration::from_secs(self.rate_limit_window_seconds.max(1)),
        }
    }
}
