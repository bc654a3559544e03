//! Database gateway
//!
//! Owns one connection lifecycle:
//!
//! ```text
//! Unconnected --connect--> Connecting (<= max_retries attempts) --> Connected
//!                                                              \--> Failed
//! ```
//!
//! Configuration problems (missing credentials, unsupported SGBD, options the
//! driver rejects) are returned as errors at once. Transient failures are
//! retried with a fixed wait; once retries run out `connect` reports
//! [`ConnectOutcome::Failed`] instead of an error so the caller picks the
//! policy. Writes are only accepted while `Connected` and are never retried.

use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::connector::{Connector, DatabaseHandle, Statement};
use super::credentials::{Credentials, CredentialsProvider};
use super::{statements, ConnectionDescriptor, TableName};
use crate::error::{ConfigurationError, PersistenceError, Result};
use crate::record::QuoteRow;

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayState {
    Unconnected,
    Connecting,
    Connected,
    Failed,
}

impl fmt::Display for GatewayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GatewayState::Unconnected => "unconnected",
            GatewayState::Connecting => "connecting",
            GatewayState::Connected => "connected",
            GatewayState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of [`DatabaseGateway::connect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum ConnectOutcome {
    Connected { attempts: u32 },
    Failed { attempts: u32 },
}

impl ConnectOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectOutcome::Connected { .. })
    }
}

/// How `save` treats existing rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Insert only
    #[default]
    Append,
    /// Truncate the table, then insert, in one transaction
    Replace,
}

impl WriteMode {
    pub fn from_truncate_flag(truncate: bool) -> Self {
        if truncate {
            WriteMode::Replace
        } else {
            WriteMode::Append
        }
    }
}

enum ConnectionState<H> {
    Unconnected,
    Connecting,
    Connected(H),
    Failed { attempts: u32 },
}

pub struct DatabaseGateway<C: Connector, P: CredentialsProvider> {
    descriptor: ConnectionDescriptor,
    credentials: P,
    connector: C,
    write_mode: WriteMode,
    state: ConnectionState<C::Handle>,
}

impl<C: Connector, P: CredentialsProvider> DatabaseGateway<C, P> {
    pub fn new(
        descriptor: ConnectionDescriptor,
        credentials: P,
        connector: C,
        write_mode: WriteMode,
    ) -> Self {
        Self {
            descriptor,
            credentials,
            connector,
            write_mode,
            state: ConnectionState::Unconnected,
        }
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    pub fn state(&self) -> GatewayState {
        match self.state {
            ConnectionState::Unconnected => GatewayState::Unconnected,
            ConnectionState::Connecting => GatewayState::Connecting,
            ConnectionState::Connected(_) => GatewayState::Connected,
            ConnectionState::Failed { .. } => GatewayState::Failed,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Resolve the SGBD and credentials. No network I/O.
    pub fn initialize(&self) -> std::result::Result<Credentials, ConfigurationError> {
        let sgbd = self.descriptor.sgbd()?;
        let credentials = self.credentials.credentials(&self.descriptor, sgbd)?;
        debug!(sgbd = %sgbd, target_db = %credentials, "Database gateway initialized");
        Ok(credentials)
    }

    /// Connect with up to `max_retries` attempts, sleeping `wait` between them.
    ///
    /// `max_retries` of zero still makes one attempt. Already connected
    /// gateways return immediately.
    #[tracing::instrument(skip(self), fields(db = %self.descriptor.db_name, env = %self.descriptor.environment))]
    pub async fn connect(&mut self, max_retries: u32, wait: Duration) -> Result<ConnectOutcome> {
        match self.state {
            ConnectionState::Connected(_) => return Ok(ConnectOutcome::Connected { attempts: 0 }),
            ConnectionState::Failed { attempts } => {
                info!(previous_attempts = attempts, "Reconnecting after an exhausted connect");
            },
            _ => {},
        }

        let credentials = self.initialize()?;
        let max_attempts = max_retries.max(1);

        for attempt in 1..=max_attempts {
            self.state = ConnectionState::Connecting;

            match self.open(&credentials).await {
                Ok(handle) => {
                    info!(attempt, target_db = %credentials, "Connected to database");
                    self.state = ConnectionState::Connected(handle);
                    return Ok(ConnectOutcome::Connected { attempts: attempt });
                },
                Err(sqlx::Error::Configuration(source)) => {
                    self.state = ConnectionState::Unconnected;
                    return Err(
                        ConfigurationError::Driver(sqlx::Error::Configuration(source)).into()
                    );
                },
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "Failed to connect to database");
                    if attempt < max_attempts {
                        tokio::time::sleep(wait).await;
                    }
                },
            }
        }

        error!(attempts = max_attempts, "Maximum number of connection attempts reached");
        self.state = ConnectionState::Failed {
            attempts: max_attempts,
        };
        Ok(ConnectOutcome::Failed {
            attempts: max_attempts,
        })
    }

    /// Open a handle and probe it; a handle that fails the probe is closed.
    async fn open(&self, credentials: &Credentials) -> std::result::Result<C::Handle, sqlx::Error> {
        let handle = self.connector.connect(credentials).await?;
        if let Err(e) = handle.ping().await {
            handle.close().await;
            return Err(e);
        }
        Ok(handle)
    }

    /// Create the quote table if missing, retrying like `connect`.
    ///
    /// Running out of attempts is an error here, not a sentinel.
    #[tracing::instrument(skip(self, table), fields(table = %table))]
    pub async fn create_schema(
        &self,
        table: &TableName,
        max_retries: u32,
        wait: Duration,
    ) -> Result<()> {
        let handle = self.handle(table)?;
        let statement = statements::create_table(table);
        let max_attempts = max_retries.max(1);

        for attempt in 1..max_attempts {
            match handle.execute(&statement).await {
                Ok(_) => {
                    info!(attempt, "Table schema ensured");
                    return Ok(());
                },
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "Failed to create table");
                    tokio::time::sleep(wait).await;
                },
            }
        }

        match handle.execute(&statement).await {
            Ok(_) => {
                info!(attempt = max_attempts, "Table schema ensured");
                Ok(())
            },
            Err(source) => {
                error!(attempt = max_attempts, error = %source, "Failed to create table");
                Err(PersistenceError::CreateSchema {
                    table: table.to_string(),
                    attempts: max_attempts,
                    source,
                }
                .into())
            },
        }
    }

    /// Empty `table`. Does nothing unless the gateway is in replace mode.
    pub async fn truncate(&self, table: &TableName) -> Result<()> {
        let handle = self.handle(table)?;
        if self.write_mode == WriteMode::Append {
            debug!(table = %table, "Append mode, skipping truncate");
            return Ok(());
        }

        handle
            .execute(&statements::truncate(table))
            .await
            .map_err(|source| PersistenceError::Truncate {
                table: table.to_string(),
                source,
            })?;

        info!(table = %table, "Table truncated");
        Ok(())
    }

    /// Append `row` to `table`, truncating first in replace mode.
    pub async fn save(&self, row: &QuoteRow, table: &TableName) -> Result<u64> {
        let handle = self.handle(table)?;

        let mut batch: Vec<Statement> = Vec::with_capacity(2);
        if self.write_mode == WriteMode::Replace {
            batch.push(statements::truncate(table));
        }
        batch.push(statements::insert(table, row));

        let affected = handle
            .execute_in_transaction(&batch)
            .await
            .map_err(|source| {
                error!(table = %table, error = %source, "Failed to save data");
                PersistenceError::Insert {
                    table: table.to_string(),
                    source,
                }
            })?;

        info!(table = %table, extract_at = row.extract_at(), "Data saved");
        Ok(affected)
    }

    fn handle(&self, table: &TableName) -> std::result::Result<&C::Handle, PersistenceError> {
        match &self.state {
            ConnectionState::Connected(handle) => Ok(handle),
            _ => Err(PersistenceError::NotConnected {
                state: self.state(),
                table: table.to_string(),
            }),
        }
    }

    /// Close the handle, if any, and return to `Unconnected`.
    pub async fn disconnect(&mut self) {
        let previous = std::mem::replace(&mut self.state, ConnectionState::Unconnected);
        if let ConnectionState::Connected(handle) = previous {
            handle.close().await;
            debug!("Database handle closed");
        }
    }
}
