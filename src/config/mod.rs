//! Configuration management for TraderPlan
//!
//! Loads from config files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::types::PlanConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Plan used when the store has no saved configuration
    pub plan: PlanConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// "csv" (files under data_dir) or "memory" (nothing survives the process)
    pub backend: String,
    /// Data directory for the csv backend
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        Self::load_with_overrides(None, None)
    }

    /// Load configuration, letting command-line values win over every other source.
    ///
    /// Validation runs once, after the overrides are merged, so a bad value in
    /// a config file can be corrected from the command line.
    pub fn load_with_overrides(backend: Option<String>, data_dir: Option<String>) -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let defaults = PlanConfig::default();
        let config = Config::builder()
            // Plan defaults
            .set_default("plan.initial_balance", defaults.initial_balance)?
            .set_default("plan.target_balance", defaults.target_balance)?
            .set_default("plan.win_amount", defaults.win_amount)?
            .set_default("plan.loss_amount", defaults.loss_amount)?
            .set_default("plan.daily_percentage", defaults.daily_percentage)?
            .set_default(
                "plan.max_trades_per_day",
                defaults.max_trades_per_day.map(i64::from),
            )?
            // Persistence defaults
            .set_default("persistence.backend", "csv")?
            .set_default("persistence.data_dir", "./data")?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (TRADERPLAN__*)
            .add_source(Environment::with_prefix("TRADERPLAN").separator("__"))
            // Command-line flags
            .set_override_option("persistence.backend", backend)?
            .set_override_option("persistence.data_dir", data_dir)?
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject settings the application cannot start with.
    ///
    /// Plan issues are not fatal here; the controller reports them and the
    /// engine degrades to an empty roadmap.
    pub fn validate(&self) -> Result<()> {
        self.store_backend()?;
        if self.persistence.data_dir.trim().is_empty() {
            bail!("persistence.data_dir must not be empty");
        }
        Ok(())
    }

    pub fn store_backend(&self) -> Result<StoreBackend> {
        self.persistence.backend.parse()
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "initial={:.2} target={:.2} win={:.2} loss={:.2} daily_pct={:.2} backend={} data_dir={}",
            self.plan.initial_balance,
            self.plan.target_balance,
            self.plan.win_amount,
            self.plan.loss_amount,
            self.plan.daily_percentage,
            self.persistence.backend,
            self.persistence.data_dir
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
