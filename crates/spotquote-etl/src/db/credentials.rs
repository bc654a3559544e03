//! Database credentials
//!
//! Credentials are looked up per [`ConnectionDescriptor`]. The default
//! provider reads a dotenv file named by convention:
//!
//! ```text
//! <connection_folder>/<sgbd_name>/.env.<environment>_<db_name>
//!
//! DB_HOST=localhost
//! DB_PORT=5432
//! DB_USER=etl
//! DB_PASSWORD=secret
//! DB_NAME=etl_bitcoin_jd
//! ```

use sqlx::postgres::PgConnectOptions;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

use super::{ConnectionDescriptor, Sgbd};
use crate::error::ConfigurationError;

pub const DB_HOST: &str = "DB_HOST";
pub const DB_PORT: &str = "DB_PORT";
pub const DB_USER: &str = "DB_USER";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const DB_NAME: &str = "DB_NAME";

/// Resolved connection parameters
///
/// `Debug` and `Display` never show the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub user: String,
    password: String,
    pub database: String,
}

impl Credentials {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.into(),
        }
    }

    /// Build from `DB_*` key/value pairs. `origin` names the source in errors.
    pub fn from_vars(
        vars: &HashMap<String, String>,
        origin: &str,
    ) -> Result<Self, ConfigurationError> {
        let get = |key: &'static str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigurationError::MissingKey {
                    key,
                    origin: origin.to_string(),
                })
        };

        let raw_port = get(DB_PORT)?;
        let port = raw_port
            .parse()
            .map_err(|_| ConfigurationError::InvalidPort {
                value: raw_port.clone(),
                origin: origin.to_string(),
            })?;

        Ok(Self {
            host: get(DB_HOST)?,
            port,
            user: get(DB_USER)?,
            // Passwords may legitimately contain surrounding spaces.
            password: vars.get(DB_PASSWORD).cloned().ok_or_else(|| {
                ConfigurationError::MissingKey {
                    key: DB_PASSWORD,
                    origin: origin.to_string(),
                }
            })?,
            database: get(DB_NAME)?,
        })
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// sqlx connect options for these credentials
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "postgresql://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

/// Source of credentials for a descriptor
pub trait CredentialsProvider: Send + Sync {
    fn credentials(
        &self,
        descriptor: &ConnectionDescriptor,
        sgbd: Sgbd,
    ) -> Result<Credentials, ConfigurationError>;
}

/// Reads the dotenv file at [`ConnectionDescriptor::credentials_path`]
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvFileCredentials;

impl CredentialsProvider for EnvFileCredentials {
    fn credentials(
        &self,
        descriptor: &ConnectionDescriptor,
        _sgbd: Sgbd,
    ) -> Result<Credentials, ConfigurationError> {
        let path = descriptor.credentials_path();
        if !path.is_file() {
            return Err(ConfigurationError::CredentialsNotFound { path });
        }

        let unreadable = |source| ConfigurationError::CredentialsUnreadable {
            path: path.clone(),
            source,
        };

        let mut vars = HashMap::new();
        for item in dotenvy::from_path_iter(&path).map_err(unreadable)? {
            let (key, value) = item.map_err(unreadable)?;
            vars.insert(key, value);
        }

        debug!(path = %path.display(), keys = vars.len(), "Loaded database credentials file");
        Credentials::from_vars(&vars, &path.display().to_string())
    }
}

/// Fixed credentials keyed by credentials path, for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentials {
    entries: HashMap<PathBuf, Credentials>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register credentials for the descriptor's conventional path.
    pub fn with(mut self, descriptor: &ConnectionDescriptor, credentials: Credentials) -> Self {
        self.entries
            .insert(descriptor.credentials_path(), credentials);
        self
    }
}

impl CredentialsProvider for InMemoryCredentials {
    fn credentials(
        &self,
        descriptor: &ConnectionDescriptor,
        _sgbd: Sgbd,
    ) -> Result<Credentials, ConfigurationError> {
        let path = descriptor.credentials_path();
        self.entries
            .get(&path)
            .cloned()
            .ok_or(ConfigurationError::CredentialsNotFound { path })
    }
}
