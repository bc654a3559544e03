//! Shared fakes for spotquote-etl integration tests
//!
//! - [`FakeConnector`]: scripted connect/probe/write failures, counts attempts
//!   and records every statement it is asked to run
//! - [`descriptor`] / [`credentials`]: the default dev descriptor with
//!   in-memory credentials
#![allow(dead_code)]

use async_trait::async_trait;
use spotquote_etl::db::{
    ConnectionDescriptor, Connector, Credentials, DatabaseHandle, InMemoryCredentials, Statement,
    TableName,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

pub const TABLE: &str = "quotes_btc_daily_event";

pub fn table() -> TableName {
    TableName::new(TABLE).expect("valid table name")
}

pub fn descriptor() -> ConnectionDescriptor {
    ConnectionDescriptor::new("dev", "etl_bitcoin_jd", "postgresql", "databases_connection")
}

pub fn credentials() -> InMemoryCredentials {
    InMemoryCredentials::new().with(
        &descriptor(),
        Credentials::new("localhost", 5432, "etl", "etl", "etl_bitcoin_jd"),
    )
}

/// How a fake connection attempt fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Network-level failure, retried by the gateway
    Transient,
    /// Driver rejects the options, never retried
    Configuration,
}

impl Failure {
    fn error(self) -> sqlx::Error {
        match self {
            Failure::Transient => sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )),
            Failure::Configuration => sqlx::Error::Configuration("invalid sslmode".into()),
        }
    }
}

#[derive(Default)]
struct Script {
    /// Connect attempts that fail before one succeeds; `None` = always fail
    connect_failures: Option<u32>,
    connect_failure: Option<Failure>,
    ping_failures: u32,
    execute_failures: u32,
}

#[derive(Default)]
struct Shared {
    script: Mutex<Script>,
    connect_attempts: AtomicU32,
    pings: AtomicU32,
    closed: AtomicU32,
    executed: Mutex<Vec<Statement>>,
    transactions: Mutex<Vec<Vec<Statement>>>,
    fail_writes: AtomicBool,
}

/// Scriptable in-memory connector
#[derive(Clone, Default)]
pub struct FakeConnector {
    shared: Arc<Shared>,
}

impl FakeConnector {
    pub fn healthy() -> Self {
        Self::default()
    }

    /// Every connection attempt fails with `failure`.
    pub fn always_failing(failure: Failure) -> Self {
        let connector = Self::default();
        {
            let mut script = connector.shared.script.lock().unwrap();
            script.connect_failures = None;
            script.connect_failure = Some(failure);
        }
        connector
    }

    /// The first `n` attempts fail transiently, then connecting works.
    pub fn failing_first(n: u32) -> Self {
        let connector = Self::default();
        {
            let mut script = connector.shared.script.lock().unwrap();
            script.connect_failures = Some(n);
            script.connect_failure = Some(Failure::Transient);
        }
        connector
    }

    /// Connections open but the first `n` probes fail.
    pub fn failing_pings(n: u32) -> Self {
        let connector = Self::default();
        connector.shared.script.lock().unwrap().ping_failures = n;
        connector
    }

    /// The first `n` single statements fail (used for schema creation).
    pub fn failing_executes(n: u32) -> Self {
        let connector = Self::default();
        connector.shared.script.lock().unwrap().execute_failures = n;
        connector
    }

    /// Every transactional write fails.
    pub fn failing_writes() -> Self {
        let connector = Self::default();
        connector.shared.fail_writes.store(true, Ordering::SeqCst);
        connector
    }

    pub fn connect_attempts(&self) -> u32 {
        self.shared.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn pings(&self) -> u32 {
        self.shared.pings.load(Ordering::SeqCst)
    }

    pub fn closed_handles(&self) -> u32 {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Single statements, in order.
    pub fn executed(&self) -> Vec<Statement> {
        self.shared.executed.lock().unwrap().clone()
    }

    /// Transactions that were attempted, committed or not.
    pub fn transactions(&self) -> Vec<Vec<Statement>> {
        self.shared.transactions.lock().unwrap().clone()
    }

    /// Every statement seen, single or transactional.
    pub fn all_sql(&self) -> Vec<String> {
        let mut sql: Vec<String> = self.executed().iter().map(|s| s.sql().to_string()).collect();
        for tx in self.transactions() {
            sql.extend(tx.iter().map(|s| s.sql().to_string()));
        }
        sql
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Handle = FakeHandle;

    async fn connect(&self, _credentials: &Credentials) -> Result<FakeHandle, sqlx::Error> {
        let attempt = self.shared.connect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let script = self.shared.script.lock().unwrap();

        if let Some(failure) = script.connect_failure {
            let still_failing = script.connect_failures.map_or(true, |n| attempt <= n);
            if still_failing {
                return Err(failure.error());
            }
        }

        Ok(FakeHandle {
            shared: Arc::clone(&self.shared),
        })
    }
}

pub struct FakeHandle {
    shared: Arc<Shared>,
}

#[async_trait]
impl DatabaseHandle for FakeHandle {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        self.shared.pings.fetch_add(1, Ordering::SeqCst);
        let mut script = self.shared.script.lock().unwrap();
        if script.ping_failures > 0 {
            script.ping_failures -= 1;
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, sqlx::Error> {
        self.shared.executed.lock().unwrap().push(statement.clone());
        let mut script = self.shared.script.lock().unwrap();
        if script.execute_failures > 0 {
            script.execute_failures -= 1;
            return Err(sqlx::Error::Protocol("server closed the connection".into()));
        }
        Ok(0)
    }

    async fn execute_in_transaction(&self, statements: &[Statement]) -> Result<u64, sqlx::Error> {
        self.shared
            .transactions
            .lock()
            .unwrap()
            .push(statements.to_vec());
        if self.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol(
                "duplicate key value violates unique constraint".into(),
            ));
        }
        Ok(1)
    }

    async fn close(&self) {
        self.shared.closed.fetch_add(1, Ordering::SeqCst);
    }
}
