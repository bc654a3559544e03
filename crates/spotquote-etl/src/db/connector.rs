//! Driver seam
//!
//! The gateway only talks to the database through [`Connector`] and
//! [`DatabaseHandle`]. Production opens one sqlx connection per attempt;
//! tests plug in fakes that count attempts and record statements.

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{Connection, PgConnection, Postgres};
use std::io;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::Credentials;

/// Default time allowed to open a connection before the attempt counts as failed.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// One SQL statement with positional text parameters (`$1`, `$2`, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    binds: Vec<Option<String>>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    pub fn bind(mut self, value: Option<&str>) -> Self {
        self.binds.push(value.map(str::to_string));
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[Option<String>] {
        &self.binds
    }

    fn query(&self) -> Query<'_, Postgres, PgArguments> {
        self.binds
            .iter()
            .fold(sqlx::query(&self.sql), |query, value| query.bind(value.as_deref()))
    }
}

/// Opens handles to a database
#[async_trait]
pub trait Connector: Send + Sync {
    type Handle: DatabaseHandle;

    async fn connect(&self, credentials: &Credentials) -> Result<Self::Handle, sqlx::Error>;
}

/// Live connection the gateway probes and writes through
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    /// Lightweight liveness probe (`SELECT 1`)
    async fn ping(&self) -> Result<(), sqlx::Error>;

    /// Run one statement, returning affected rows.
    async fn execute(&self, statement: &Statement) -> Result<u64, sqlx::Error>;

    /// Run statements in order inside one transaction; all or nothing.
    async fn execute_in_transaction(&self, statements: &[Statement]) -> Result<u64, sqlx::Error>;

    /// Release the handle's resources.
    async fn close(&self);
}

/// sqlx PostgreSQL connector
///
/// Each `connect` call is exactly one wire attempt: a refused connection fails
/// at once and a silent host fails after `connect_timeout`. Retrying is left
/// to the gateway.
#[derive(Debug, Clone)]
pub struct PgConnector {
    connect_timeout: Duration,
}

impl PgConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl Default for PgConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Handle = PgHandle;

    async fn connect(&self, credentials: &Credentials) -> Result<PgHandle, sqlx::Error> {
        debug!(target_db = %credentials, timeout = ?self.connect_timeout, "Opening connection");

        let options = credentials.connect_options();
        let conn = tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&options))
            .await
            .map_err(|_| {
                sqlx::Error::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no connection within {:?}", self.connect_timeout),
                ))
            })??;

        Ok(PgHandle {
            conn: Mutex::new(Some(conn)),
        })
    }
}

/// Single-connection handle; `close` terminates the session and later calls
/// fail with `PoolClosed`.
#[derive(Debug)]
pub struct PgHandle {
    conn: Mutex<Option<PgConnection>>,
}

#[async_trait]
impl DatabaseHandle for PgHandle {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(sqlx::Error::PoolClosed)?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, sqlx::Error> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(sqlx::Error::PoolClosed)?;
        let result = statement.query().execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    async fn execute_in_transaction(&self, statements: &[Statement]) -> Result<u64, sqlx::Error> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(sqlx::Error::PoolClosed)?;

        // Dropping an uncommitted transaction rolls it back.
        let mut tx = conn.begin().await?;
        let mut affected = 0;
        for statement in statements {
            affected += statement.query().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        Ok(affected)
    }

    async fn close(&self) {
        if let Some(conn) = self.conn.lock().await.take() {
            if let Err(e) = conn.close().await {
                debug!(error = %e, "Connection did not close cleanly");
            }
        }
    }
}
