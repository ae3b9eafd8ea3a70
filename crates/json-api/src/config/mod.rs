//! Server configuration module

use clap::Parser;

use crate::config::{
    database::DatabaseConfig,
    kitchen::KitchenConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    pricing::PricingConfig,
    rate_limits::RateLimitConfig,
    seed::SeedConfig,
    server::ServerRuntimeConfig,
};

pub(crate) mod database;
pub(crate) mod kitchen;
pub(crate) mod observability;
pub(crate) mod pricing;
pub(crate) mod rate_limits;
pub(crate) mod seed;
pub(crate) mod server;

/// Tiffin JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "tiffin-json", about = "Tiffin JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// `PostgreSQL` connection.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces and metrics) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Delivery charge and minimum order settings.
    #[command(flatten)]
    pub pricing: PricingConfig,

    /// Promo and checkout rate limits.
    #[command(flatten)]
    pub rate_limits: RateLimitConfig,

    /// Kitchen display access.
    #[command(flatten)]
    pub kitchen: KitchenConfig,

    /// Menu and promotions seed data.
    #[command(flatten)]
    pub seed: SeedConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }
}
