//! Spotquote ETL Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Fetches one spot price quote from a JSON API, validates it, stamps it with
//! the extraction time and appends it to a PostgreSQL table.
//!
//! # Components
//!
//! - **api**: `ApiClient`, one GET with a 10 second timeout
//! - **validator**: schema check of the `{"data": {...}}` payload
//! - **service**: `ExtractionService`, fetch + validate + project
//! - **db**: credentials, driver seam and the `DatabaseGateway`
//! - **command**: service + gateway + target table
//! - **job**: the full cycle used by the `spotquote-etl` binary
//!
//! # Example
//!
//! ```no_run
//! use spotquote_common::timestamp;
//! use spotquote_etl::{api::ApiClient, config::JobConfig, db, job};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = JobConfig::load()?;
//!     let report = job::run(
//!         &config,
//!         ApiClient::new(&config.api_url)?,
//!         db::PgConnector::default(),
//!         db::EnvFileCredentials,
//!         timestamp::now,
//!     )
//!     .await?;
//!     println!("{}", report.row);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod job;
pub mod record;
pub mod service;
pub mod validator;

// Re-export commonly used types
pub use error::{EtlError, ErrorKind, Result};
pub use record::{QuoteRecord, QuoteRow};
