//! Error types for the quote ETL
//!
//! Each stage fails with its own enum; [`EtlError`] wraps them so callers can
//! propagate with `?` and still branch on [`EtlError::kind`].

use std::path::PathBuf;
use thiserror::Error;

use crate::db::GatewayState;

/// Result type alias for ETL operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Coarse failure category, stable across message changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Connection,
    Validation,
    Persistence,
}

/// Bad or missing configuration. Never retried.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration file '{}' not found.", path.display())]
    CredentialsNotFound { path: PathBuf },

    #[error("Failed to read configuration file '{}': {source}", path.display())]
    CredentialsUnreadable {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Missing key '{key}' in {origin}")]
    MissingKey { key: &'static str, origin: String },

    #[error("Invalid port '{value}' in {origin}")]
    InvalidPort { value: String, origin: String },

    #[error("SGBD '{0}' is not supported")]
    UnsupportedSgbd(String),

    #[error("Invalid table name '{0}': expected [schema.]table made of letters, digits and underscores")]
    InvalidTableName(String),

    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("Database driver rejected the connection options: {0}")]
    Driver(#[source] sqlx::Error),
}

/// Remote endpoint unreachable or answering with a failure status
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Connection error: Please try again. GET {url} returned HTTP {status}")]
    ApiStatus { url: String, status: u16 },

    #[error("Connection error: Please try again. GET {url} failed: {source}")]
    ApiTransport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Database '{database}' unreachable after {attempts} connection attempts")]
    DatabaseUnavailable { database: String, attempts: u32 },
}

/// API payload does not match the quote schema
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Data validation error: response body is not valid JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("Data validation error: missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Data validation error: field '{field}' must be {expected}, got {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Data validation error: field '{field}' {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Write path failures; the driver error is kept as the source.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to save data to table '{table}': {source}")]
    Insert {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to truncate table '{table}': {source}")]
    Truncate {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to create table '{table}' after {attempts} attempts: {source}")]
    CreateSchema {
        table: String,
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database gateway is {state}; cannot write to '{table}' without a connection")]
    NotConnected { state: GatewayState, table: String },
}

/// Top-level error for one ETL run
#[derive(Error, Debug)]
pub enum EtlError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl EtlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EtlError::Configuration(_) => ErrorKind::Configuration,
            EtlError::Connection(_) => ErrorKind::Connection,
            EtlError::Validation(_) => ErrorKind::Validation,
            EtlError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}
