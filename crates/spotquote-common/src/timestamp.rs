//! Extraction timestamp formatting
//!
//! Rows are stamped with the local wall clock at load time, rendered as
//! `YYYY-MM-DD HH:MM:SS` and stored as text.

use chrono::{Local, NaiveDateTime};

/// `strftime` pattern of the `extract_at` column.
pub const EXTRACT_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local wall-clock time, truncated to whole seconds by the format.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Render a timestamp in the `extract_at` format.
pub fn format(at: NaiveDateTime) -> String {
    at.format(EXTRACT_AT_FORMAT).to_string()
}

/// Parse a value previously produced by [`format`].
pub fn parse(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, EXTRACT_AT_FORMAT).ok()
}
