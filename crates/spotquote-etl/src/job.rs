//! One fetch-validate-stamp-store cycle
//!
//! Order matters: the database is reached first so a run that cannot store
//! anything does not hit the quote API.

use chrono::NaiveDateTime;
use tracing::info;

use crate::api::QuoteSource;
use crate::command::QuoteCommand;
use crate::config::JobConfig;
use crate::db::{ConnectOutcome, Connector, CredentialsProvider, DatabaseGateway};
use crate::error::{ConnectionError, Result};
use crate::record::QuoteRow;
use crate::service::ExtractionService;

/// What a successful run did
#[derive(Debug, Clone)]
pub struct JobReport {
    pub row: QuoteRow,
    pub connect_attempts: u32,
    pub rows_written: u64,
}

/// Run the job against the given source, connector and credentials.
///
/// `clock` supplies the `extract_at` time and is called once, after the
/// record validated.
#[tracing::instrument(skip_all, fields(table = %config.table_name))]
pub async fn run<S, C, P, F>(
    config: &JobConfig,
    source: S,
    connector: C,
    credentials: P,
    clock: F,
) -> Result<JobReport>
where
    S: QuoteSource,
    C: Connector,
    P: CredentialsProvider,
    F: FnOnce() -> NaiveDateTime,
{
    let table = config.table()?;
    let mut gateway =
        DatabaseGateway::new(config.descriptor(), credentials, connector, config.write_mode());

    let connect_attempts = match gateway.connect(config.max_retries, config.wait()).await? {
        ConnectOutcome::Connected { attempts } => attempts,
        ConnectOutcome::Failed { attempts } => {
            return Err(ConnectionError::DatabaseUnavailable {
                database: config.db_name.clone(),
                attempts,
            }
            .into());
        },
    };

    if config.create_schema {
        if let Err(e) = gateway
            .create_schema(&table, config.max_retries, config.wait())
            .await
        {
            gateway.disconnect().await;
            return Err(e);
        }
    }

    let command = QuoteCommand::new(ExtractionService::new(source), gateway, table);

    let outcome: Result<(QuoteRow, u64)> = async {
        let row = command.command().await?.stamp(clock());
        info!(table = %command.table(), "Stamped row:\n{}", row);
        let rows_written = command.save(&row).await?;
        Ok((row, rows_written))
    }
    .await;

    command.into_gateway().disconnect().await;

    let (row, rows_written) = outcome?;
    Ok(JobReport {
        row,
        connect_attempts,
        rows_written,
    })
}

/// Fetch, validate and stamp without touching the database.
pub async fn extract<S, F>(source: S, clock: F) -> Result<QuoteRow>
where
    S: QuoteSource,
    F: FnOnce() -> NaiveDateTime,
{
    let row = ExtractionService::new(source).run().await?.stamp(clock());
    info!("Stamped row:\n{}", row);
    Ok(row)
}
