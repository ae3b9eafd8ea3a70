//! Database Config

use clap::Args;

/// Order and session storage settings.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string for menu, orders and sessions
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
}
