//! Kitchen Config

use clap::Args;

/// Kitchen display settings.
#[derive(Debug, Args)]
pub struct KitchenConfig {
    /// Bearer token required by the kitchen display endpoints
    #[arg(long, env = "KITCHEN_TOKEN", hide_env_values = true)]
    pub kitchen_token: String,
}
