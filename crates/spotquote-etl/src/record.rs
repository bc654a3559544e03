//! Quote records
//!
//! A [`QuoteRecord`] only exists once its payload validated. Stamping consumes
//! it and yields the [`QuoteRow`] that the gateway persists, so a row can never
//! be written without both steps.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use spotquote_common::timestamp;
use std::fmt;

use crate::error::ValidationError;
use crate::validator::spot_fields;

/// Validated spot quote, not yet stamped
///
/// [`QuoteRecord::from_payload`] is the only constructor; records cannot be
/// deserialized around the validator.
///
/// ```compile_fail
/// let _ = serde_json::from_value::<spotquote_etl::QuoteRecord>(serde_json::json!({
///     "amount": "not a number", "base": "", "currency": "7", "source_timestamp": null
/// }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteRecord {
    amount: String,
    base: String,
    currency: String,
    source_timestamp: Option<String>,
}

impl QuoteRecord {
    /// Validate `raw` and project it into a record.
    pub fn from_payload(raw: &Value) -> Result<Self, ValidationError> {
        let fields = spot_fields(raw)?;
        Ok(Self {
            amount: fields.amount.to_string(),
            base: fields.base.to_string(),
            currency: fields.currency.to_string(),
            source_timestamp: fields.timestamp.map(str::to_string),
        })
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn source_timestamp(&self) -> Option<&str> {
        self.source_timestamp.as_deref()
    }

    /// Attach the extraction time.
    pub fn stamp(self, at: NaiveDateTime) -> QuoteRow {
        QuoteRow {
            record: self,
            extract_at: timestamp::format(at),
        }
    }

    /// Attach the current local wall-clock time.
    pub fn stamp_now(self) -> QuoteRow {
        self.stamp(timestamp::now())
    }
}

/// One persisted row: the record plus `extract_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteRow {
    #[serde(flatten)]
    record: QuoteRecord,
    extract_at: String,
}

impl QuoteRow {
    /// Column order used for inserts and schema creation.
    pub const COLUMNS: [&'static str; 5] =
        ["amount", "base", "currency", "source_timestamp", "extract_at"];

    pub fn record(&self) -> &QuoteRecord {
        &self.record
    }

    pub fn extract_at(&self) -> &str {
        &self.extract_at
    }

    /// Values in [`QuoteRow::COLUMNS`] order; `None` maps to SQL NULL.
    pub fn values(&self) -> [Option<&str>; 5] {
        [
            Some(self.record.amount()),
            Some(self.record.base()),
            Some(self.record.currency()),
            self.record.source_timestamp(),
            Some(self.extract_at()),
        ]
    }
}

impl fmt::Display for QuoteRow {
    /// Single-row table, header first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<&str> = self.values().iter().map(|v| v.unwrap_or("NULL")).collect();
        let widths: Vec<usize> = Self::COLUMNS
            .iter()
            .zip(&cells)
            .map(|(col, cell)| col.len().max(cell.len()))
            .collect();

        for (col, width) in Self::COLUMNS.iter().zip(&widths) {
            write!(f, "{:<width$}  ", col, width = *width)?;
        }
        writeln!(f)?;
        for (cell, width) in cells.iter().zip(&widths) {
            write!(f, "{:<width$}  ", cell, width = *width)?;
        }
        Ok(())
    }
}
