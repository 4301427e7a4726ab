//! Application configuration

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use restock_predictor::{Prior, PriorTable};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub monitoring: MonitoringConfig,
    /// Category prior overrides merged over the builtin table.
    #[serde(default)]
    pub priors: HashMap<String, PriorConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub log_json: bool,
    pub log_target: bool,
    pub log_line_number: bool,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PriorConfig {
    pub mean_days: f64,
    pub mad_days: f64,
}

impl Config {
    /// Loads configuration from files and environment variables, later
    /// sources overriding earlier ones:
    ///
    /// 1. config/default.toml (required)
    /// 2. Custom config file (if a path is provided)
    /// 3. config/dev.toml (optional, local development)
    /// 4. Environment variables, e.g. RESTOCK_DATABASE__URL=...
    pub fn load(config_path: Option<String>) -> Result<Self, ConfigError> {
        let mut builder = ConfigLoader::builder().add_source(File::with_name("config/default"));

        if let Some(ref path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }

        builder = builder.add_source(File::with_name("config/dev").required(false));

        let config = builder
            .add_source(Environment::with_prefix("RESTOCK").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// The immutable prior table handed to the predictor at boot.
    pub fn prior_table(&self) -> PriorTable {
        let mut table = PriorTable::builtin();

        for (category_id, prior) in &self.priors {
            table.insert(category_id, Prior {
                mean_days: prior.mean_days,
                mad_days: prior.mad_days,
            });
        }

        table
    }
}
