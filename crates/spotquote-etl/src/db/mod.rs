//! Database access
//!
//! - [`credentials`]: resolving host/user/password for an environment
//! - [`connector`]: the driver seam (`Connector`, `DatabaseHandle`) and its sqlx implementation
//! - [`statements`]: SQL for schema creation, truncate and insert
//! - [`gateway`]: connection lifecycle with bounded retry, and the write path

pub mod connector;
pub mod credentials;
pub mod gateway;
pub mod statements;

pub use connector::{Connector, DatabaseHandle, PgConnector, PgHandle, Statement};
pub use credentials::{Credentials, CredentialsProvider, EnvFileCredentials, InMemoryCredentials};
pub use gateway::{ConnectOutcome, DatabaseGateway, GatewayState, WriteMode};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sgbd {
    Postgresql,
}

impl Sgbd {
    /// Name used in the credentials folder layout
    pub fn as_str(self) -> &'static str {
        match self {
            Sgbd::Postgresql => "postgresql",
        }
    }
}

impl FromStr for Sgbd {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(Sgbd::Postgresql),
            _ => Err(ConfigurationError::UnsupportedSgbd(s.to_string())),
        }
    }
}

impl fmt::Display for Sgbd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which database to reach and where its credentials live
///
/// The SGBD is kept as given and only resolved when the gateway initialises,
/// so an unsupported engine fails there, before any connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub environment: String,
    pub db_name: String,
    pub sgbd_name: String,
    pub connection_folder: PathBuf,
}

impl ConnectionDescriptor {
    pub fn new(
        environment: impl Into<String>,
        db_name: impl Into<String>,
        sgbd_name: impl Into<String>,
        connection_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            environment: environment.into(),
            db_name: db_name.into(),
            sgbd_name: sgbd_name.into(),
            connection_folder: connection_folder.into(),
        }
    }

    pub fn sgbd(&self) -> Result<Sgbd, ConfigurationError> {
        self.sgbd_name.parse()
    }

    /// `<connection_folder>/<sgbd_name>/.env.<environment>_<db_name>`
    pub fn credentials_path(&self) -> PathBuf {
        self.connection_folder
            .join(&self.sgbd_name)
            .join(format!(".env.{}_{}", self.environment, self.db_name))
    }
}

/// Table identifier that is safe to interpolate into SQL
///
/// Accepts `table` or `schema.table`, each part `[A-Za-z_][A-Za-z0-9_]*` and
/// at most 63 bytes (the PostgreSQL identifier limit).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TableName(String);

const MAX_IDENTIFIER_LEN: usize = 63;

impl TableName {
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigurationError> {
        let name = name.into();
        let mut parts = 0;
        let valid = name.split('.').all(|part| {
            parts += 1;
            is_identifier(part)
        });

        if !valid || parts > 2 {
            return Err(ConfigurationError::InvalidTableName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_identifier(part: &str) -> bool {
    let mut bytes = part.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' => {},
        _ => return false,
    }
    part.len() <= MAX_IDENTIFIER_LEN && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

impl FromStr for TableName {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
