use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::LedgerError;

const DEFAULT_CONFIG_NAME: &str = "brewery-ledger";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// How many times an append re-reads the tail after losing an insert race.
    pub max_append_retries: u32,
    /// Default number of blocks returned by the timeline endpoint.
    pub timeline_limit: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://brewery-ledger.db".to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            max_append_retries: 3,
            timeline_limit: 50,
        }
    }
}

impl AppConfig {
    /// Defaults, then `brewery-ledger.toml` if present, then `LEDGER_*` env vars.
    pub fn load() -> Result<Self, LedgerError> {
        Self::load_from(None)
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self, LedgerError> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("server_host", defaults.server_host)?
            .set_default("server_port", i64::from(defaults.server_port))?
            .set_default("max_append_retries", i64::from(defaults.max_append_retries))?
            .set_default("timeline_limit", defaults.timeline_limit)?;

        builder = match path {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                builder.add_source(File::from(path))
            }
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        let config: AppConfig = builder
            .add_source(Environment::with_prefix("LEDGER").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.database_url.trim().is_empty() {
            return Err(LedgerError::ConfigError(
                "database_url must not be empty".to_string(),
            ));
        }
        if self.timeline_limit <= 0 {
            return Err(LedgerError::ConfigError(format!(
                "timeline_limit must be positive, got {}",
                self.timeline_limit
            )));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
