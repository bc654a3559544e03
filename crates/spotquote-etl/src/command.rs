//! Quote command: extraction service bound to a gateway and a target table
//!
//! `command()` produces the record, the caller stamps it, `save()` writes it.

use crate::api::QuoteSource;
use crate::db::{Connector, CredentialsProvider, DatabaseGateway, TableName};
use crate::error::Result;
use crate::record::{QuoteRecord, QuoteRow};
use crate::service::ExtractionService;

pub struct QuoteCommand<S, C, P>
where
    S: QuoteSource,
    C: Connector,
    P: CredentialsProvider,
{
    service: ExtractionService<S>,
    gateway: DatabaseGateway<C, P>,
    table: TableName,
}

impl<S, C, P> QuoteCommand<S, C, P>
where
    S: QuoteSource,
    C: Connector,
    P: CredentialsProvider,
{
    pub fn new(service: ExtractionService<S>, gateway: DatabaseGateway<C, P>, table: TableName) -> Self {
        Self {
            service,
            gateway,
            table,
        }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn gateway(&self) -> &DatabaseGateway<C, P> {
        &self.gateway
    }

    /// Run the extraction service.
    pub async fn command(&self) -> Result<QuoteRecord> {
        self.service.run().await
    }

    /// Write a stamped row to the command's table.
    pub async fn save(&self, row: &QuoteRow) -> Result<u64> {
        self.gateway.save(row, &self.table).await
    }

    /// Hand the gateway back, e.g. to disconnect.
    pub fn into_gateway(self) -> DatabaseGateway<C, P> {
        self.gateway
    }
}
