//! Application settings
//!
//! Settings are layered with the `config` crate: built-in defaults first,
//! then environment variables prefixed with `BILLING` and nested with a
//! double underscore, e.g. `BILLING__DATABASE__URL` or
//! `BILLING__BILLING__MAX_ALLOCATION_ATTEMPTS`. A `.env` file in the
//! working directory is loaded beforehand when present.

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use core_kernel::CoreError;
use domain_billing::BillingSettings;

use crate::telemetry::LogFormat;

/// Environment variable prefix for every setting
pub const ENV_PREFIX: &str = "BILLING";

/// Connection settings for PostgreSQL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/shop_billing".to_string(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 30,
            max_lifetime_secs: 30 * 60,
            idle_timeout_secs: 10 * 60,
        }
    }
}

/// Top-level settings for the billing runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub database: DatabaseSettings,
    pub billing: BillingSettings,
    /// `EnvFilter` directive, e.g. `info` or `domain_billing=debug,info`
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            database: DatabaseSettings::default(),
            billing: BillingSettings::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppSettings {
    /// Loads `.env`, then defaults overlaid with `BILLING__*` variables
    pub fn load() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();
        Self::from_environment(Environment::with_prefix(ENV_PREFIX).separator("__"))
    }

    /// Builds settings from an explicit environment source
    pub fn from_environment(environment: Environment) -> Result<Self, CoreError> {
        let settings: AppSettings = Config::builder()
            .add_source(environment.try_parsing(true))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error)?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.database.url.trim().is_empty() {
            return Err(CoreError::configuration("database.url must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(CoreError::configuration("database.max_connections must be at least 1"));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(CoreError::configuration(
                "database.min_connections must not exceed database.max_connections",
            ));
        }
        self.billing.validate()
    }
}

fn config_error(error: ConfigError) -> CoreError {
    CoreError::configuration(error.to_string())
}
