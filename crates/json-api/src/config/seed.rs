//! Seed Config

use std::path::PathBuf;

use clap::Args;

/// Seed data settings.
#[derive(Debug, Args)]
pub struct SeedConfig {
    /// YAML file with the menu and promotions
    #[arg(long, env = "SEED_FILE", default_value = "config/seed.yaml")]
    pub seed_file: PathBuf,
}
