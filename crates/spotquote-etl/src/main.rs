//! Spotquote ETL - fetch one spot quote and append it to the database

use anyhow::Result;
use clap::Parser;
use spotquote_common::logging::{init_logging, LogConfig, LogLevel};
use spotquote_common::timestamp;
use spotquote_etl::{
    api::ApiClient,
    config::JobConfig,
    db::{EnvFileCredentials, PgConnector},
    job,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "spotquote-etl")]
#[command(author, version, about = "Fetch a spot price quote and append it to a table")]
struct Cli {
    /// Fetch, validate and stamp the quote without touching the database
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // LOG_* environment variables take precedence over the flags.
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("spotquote-etl")
        .filter_directives("sqlx=warn,hyper=info,reqwest=info")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let config = JobConfig::load()?;
    info!(
        api_url = %config.api_url,
        table = %config.table_name,
        env = %config.environment,
        db = %config.db_name,
        truncate = config.truncate,
        "Starting quote ETL run"
    );

    let source = ApiClient::new(&config.api_url)?;

    let result = if cli.dry_run {
        job::extract(source, timestamp::now).await.map(|_| ())
    } else {
        job::run(
            &config,
            source,
            PgConnector::default(),
            EnvFileCredentials,
            timestamp::now,
        )
        .await
        .map(|report| {
            info!(
                rows_written = report.rows_written,
                connect_attempts = report.connect_attempts,
                extract_at = report.row.extract_at(),
                "Quote ETL run complete"
            );
        })
    };

    if let Err(e) = result {
        error!(kind = ?e.kind(), error = %e, "Quote ETL run failed");
        return Err(e.into());
    }

    Ok(())
}
