//! Extraction service: fetch, validate, project

use tracing::info;

use crate::api::QuoteSource;
use crate::error::Result;
use crate::record::QuoteRecord;

pub struct ExtractionService<S: QuoteSource> {
    source: S,
}

impl<S: QuoteSource> ExtractionService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// One fetch, one validation, one record. Errors keep their kind.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<QuoteRecord> {
        let raw = self.source.fetch().await?;
        let record = QuoteRecord::from_payload(&raw)?;

        info!(
            base = record.base(),
            currency = record.currency(),
            amount = record.amount(),
            "Quote extracted"
        );
        Ok(record)
    }
}
