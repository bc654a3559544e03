//! Spotquote Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Pieces shared by every spotquote binary and library:
//!
//! - **Logging**: tracing subscriber setup driven by `LOG_*` environment variables
//! - **Timestamps**: the wall-clock format used for the `extract_at` column
//!
//! # Example
//!
//! ```no_run
//! use spotquote_common::logging::{init_logging, LogConfig};
//! use spotquote_common::timestamp;
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!(extract_at = %timestamp::now(), "Job started");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod timestamp;
