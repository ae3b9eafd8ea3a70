//! Rate limiting
//!
//! Fixed windows keyed by action and client address. A request that would exceed the limit
//! is refused before anything else happens, so it never changes state.

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::{clock::Clock, domain::sessions::ClientAddress};

/// Actions with their own limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitedAction {
    ApplyPromo,
    Checkout,
}

impl RateLimitedAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RateLimitedAction::ApplyPromo => "apply_promo",
            RateLimitedAction::Checkout => "checkout",
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("too many attempts; try again in {} seconds", .retry_after.as_secs())]
pub struct RateLimited {
    pub action: RateLimitedAction,

    /// Time until the current window closes.
    pub retry_after: SignedDuration,
}

/// Requests allowed per window for each action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub apply_promo: u32,
    pub checkout: u32,
    pub window: SignedDuration,
}

impl RateLimits {
    pub fn limit_for(&self, action: RateLimitedAction) -> u32 {
        match action {
            RateLimitedAction::ApplyPromo => self.apply_promo,
            RateLimitedAction::Checkout => self.checkout,
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            apply_promo: 10,
            checkout: 5,
            window: SignedDuration::from_secs(60),
        }
    }
}

#[automock]
pub trait RateLimiter: Send + Sync {
    /// Counts an attempt, failing if the client has used up the current window.
    fn check(&self, action: RateLimitedAction, client: &ClientAddress) -> Result<(), RateLimited>;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Timestamp,
    count: u32,
}

pub struct FixedWindowRateLimiter {
    limits: RateLimits,
    clock: Arc<dyn Clock>,
    windows: Mutex<FxHashMap<(RateLimitedAction, ClientAddress), Window>>,
}

impl FixedWindowRateLimiter {
    pub fn new(limits: RateLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            limits,
            clock,
            windows: Mutex::new(FxHashMap::default()),
        }
    }
}

impl fmt::Debug for FixedWindowRateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedWindowRateLimiter")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check(&self, action: RateLimitedAction, client: &ClientAddress) -> Result<(), RateLimited> {
        let now = self.clock.now();
        let limit = self.limits.limit_for(action);

        // A broken limiter lets requests through rather than locking everyone out.
        let Ok(mut windows) = self.windows.lock() else {
            return Ok(());
        };

        windows.retain(|_, window| now.duration_since(window.started_at) < self.limits.window);

        let window = windows
            .entry((action, client.clone()))
            .or_insert(Window {
                started_at: now,
                count: 0,
            });

        if window.count >= limit {
            return Err(RateLimited {
                action,
                retry_after: self.limits.window - now.duration_since(window.started_at),
            });
        }

        window.count += 1;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::clock::FixedClock;

    use super::*;

    fn limiter(clock: Arc<FixedClock>) -> FixedWindowRateLimiter {
        FixedWindowRateLimiter::new(RateLimits::default(), clock)
    }

    #[test]
    fn checkout_allows_five_a_minute() -> TestResult {
        let clock = Arc::new(FixedClock::new("2026-06-01T12:00:00Z".parse()?));
        let limiter = limiter(clock.clone());
        let client = ClientAddress::new("203.0.113.9");

        for _ in 0..5 {
            limiter.check(RateLimitedAction::Checkout, &client)?;
        }

        clock.advance(SignedDuration::from_secs(20));

        let refused = limiter.check(RateLimitedAction::Checkout, &client);
        assert_eq!(
            refused,
            Err(RateLimited {
                action: RateLimitedAction::Checkout,
                retry_after: SignedDuration::from_secs(40),
            })
        );

        clock.advance(SignedDuration::from_secs(40));
        limiter.check(RateLimitedAction::Checkout, &client)?;

        Ok(())
    }

    #[test]
    fn actions_and_clients_are_counted_separately() -> TestResult {
        let clock = Arc::new(FixedClock::new("2026-06-01T12:00:00Z".parse()?));
        let limiter = limiter(clock);
        let (first, second) = (ClientAddress::new("198.51.100.1"), ClientAddress::new("198.51.100.2"));

        for _ in 0..5 {
            limiter.check(RateLimitedAction::Checkout, &first)?;
        }

        assert!(limiter.check(RateLimitedAction::Checkout, &first).is_err());
        limiter.check(RateLimitedAction::Checkout, &second)?;
        limiter.check(RateLimitedAction::ApplyPromo, &first)?;

        Ok(())
    }

    #[test]
    fn promo_codes_allow_ten_a_minute() -> TestResult {
        let clock = Arc::new(FixedClock::new("2026-06-01T12:00:00Z".parse()?));
        let limiter = limiter(clock);
        let client = ClientAddress::new("192.0.2.44");

        for _ in 0..10 {
            limiter.check(RateLimitedAction::ApplyPromo, &client)?;
        }

        assert!(limiter.check(RateLimitedAction::ApplyPromo, &client).is_err());

        Ok(())
    }
}
