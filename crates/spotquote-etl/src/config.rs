//! Job configuration
//!
//! Defaults describe the daily BTC spot job. Each knob can be overridden with
//! a `SPOTQUOTE_*` environment variable (a `.env` file in the working
//! directory is loaded first).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::db::{ConnectionDescriptor, Sgbd, TableName, WriteMode};
use crate::error::ConfigurationError;

// ============================================================================
// Job Configuration Constants
// ============================================================================

/// Default environment name, part of the credentials file name.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// Default target database name.
pub const DEFAULT_DB_NAME: &str = "etl_bitcoin_jd";

/// Default database engine identifier.
pub const DEFAULT_SGBD: &str = "postgresql";

/// Default folder holding `<sgbd>/.env.<environment>_<db_name>` files.
pub const DEFAULT_CONNECTION_FOLDER: &str = "databases_connection";

/// Default spot price endpoint.
pub const DEFAULT_API_URL: &str = "https://api.coinbase.com/v2/prices/spot";

/// Default target table.
pub const DEFAULT_TABLE_NAME: &str = "quotes_btc_daily_event";

/// Default number of database connection attempts.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default wait between database connection attempts, in seconds.
pub const DEFAULT_WAIT_SECONDS: u64 = 1;

/// Settings for one ETL run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub environment: String,
    pub db_name: String,
    pub sgbd_name: String,
    pub connection_folder: PathBuf,
    pub api_url: String,
    pub table_name: String,
    /// Truncate the table before inserting (replace mode)
    pub truncate: bool,
    /// Run `CREATE TABLE IF NOT EXISTS` after connecting
    pub create_schema: bool,
    pub max_retries: u32,
    pub wait_seconds: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            db_name: DEFAULT_DB_NAME.to_string(),
            sgbd_name: DEFAULT_SGBD.to_string(),
            connection_folder: PathBuf::from(DEFAULT_CONNECTION_FOLDER),
            api_url: DEFAULT_API_URL.to_string(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            truncate: false,
            create_schema: false,
            max_retries: DEFAULT_MAX_RETRIES,
            wait_seconds: DEFAULT_WAIT_SECONDS,
        }
    }
}

impl JobConfig {
    /// Load configuration from `.env`, environment and defaults
    pub fn load() -> Result<Self, ConfigurationError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Defaults overridden by `SPOTQUOTE_*` variables, then validated.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let defaults = Self::default();

        let config = Self {
            environment: env_or("SPOTQUOTE_ENVIRONMENT", defaults.environment)?,
            db_name: env_or("SPOTQUOTE_DB_NAME", defaults.db_name)?,
            sgbd_name: env_or("SPOTQUOTE_SGBD", defaults.sgbd_name)?,
            connection_folder: env_or("SPOTQUOTE_CONNECTION_FOLDER", defaults.connection_folder)?,
            api_url: env_or("SPOTQUOTE_API_URL", defaults.api_url)?,
            table_name: env_or("SPOTQUOTE_TABLE", defaults.table_name)?,
            truncate: env_or("SPOTQUOTE_TRUNCATE", defaults.truncate)?,
            create_schema: env_or("SPOTQUOTE_CREATE_SCHEMA", defaults.create_schema)?,
            max_retries: env_or("SPOTQUOTE_MAX_RETRIES", defaults.max_retries)?,
            wait_seconds: env_or("SPOTQUOTE_WAIT_SECONDS", defaults.wait_seconds)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, value) in [("environment", &self.environment), ("db_name", &self.db_name)] {
            if value.is_empty() || value.contains(['/', '\\']) {
                return Err(ConfigurationError::InvalidSetting {
                    name,
                    reason: format!("'{}' must be a non-empty name without path separators", value),
                });
            }
        }

        Sgbd::from_str(&self.sgbd_name)?;
        self.table()?;

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigurationError::InvalidSetting {
                name: "api_url",
                reason: format!("'{}' must start with http:// or https://", self.api_url),
            });
        }

        if self.max_retries == 0 {
            return Err(ConfigurationError::InvalidSetting {
                name: "max_retries",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    pub fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor::new(
            &self.environment,
            &self.db_name,
            &self.sgbd_name,
            &self.connection_folder,
        )
    }

    pub fn table(&self) -> Result<TableName, ConfigurationError> {
        TableName::new(&self.table_name)
    }

    pub fn write_mode(&self) -> WriteMode {
        WriteMode::from_truncate_flag(self.truncate)
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }
}

fn env_or<T>(key: &'static str, default: T) -> Result<T, ConfigurationError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigurationError::InvalidSetting {
                name: key,
                reason: format!("'{}': {}", raw, e),
            }),
        Err(_) => Ok(default),
    }
}
