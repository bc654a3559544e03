//! Credentials files on disk
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::FakeConnector;
use spotquote_etl::db::{
    ConnectionDescriptor, CredentialsProvider, DatabaseGateway, EnvFileCredentials, Sgbd,
    WriteMode,
};
use spotquote_etl::error::{ConfigurationError, EtlError};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn write_credentials(root: &Path, name: &str, contents: &str) {
    let dir = root.join("postgresql");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), contents).unwrap();
}

fn descriptor(root: &Path) -> ConnectionDescriptor {
    ConnectionDescriptor::new("dev", "etl_bitcoin_jd", "postgresql", root)
}

#[test]
fn test_reads_conventional_file() {
    let temp = TempDir::new().unwrap();
    write_credentials(
        temp.path(),
        ".env.dev_etl_bitcoin_jd",
        "DB_HOST=db.internal\nDB_PORT=5433\nDB_USER=etl\nDB_PASSWORD=\"p@ss word\"\nDB_NAME=etl_bitcoin_jd\n",
    );

    let creds = EnvFileCredentials
        .credentials(&descriptor(temp.path()), Sgbd::Postgresql)
        .unwrap();

    assert_eq!(creds.host, "db.internal");
    assert_eq!(creds.port, 5433);
    assert_eq!(creds.user, "etl");
    assert_eq!(creds.password(), "p@ss word");
    assert_eq!(creds.database, "etl_bitcoin_jd");
}

#[test]
fn test_other_environment_file_is_not_picked_up() {
    let temp = TempDir::new().unwrap();
    write_credentials(
        temp.path(),
        ".env.prod_etl_bitcoin_jd",
        "DB_HOST=h\nDB_PORT=5432\nDB_USER=u\nDB_PASSWORD=p\nDB_NAME=d\n",
    );

    let err = EnvFileCredentials
        .credentials(&descriptor(temp.path()), Sgbd::Postgresql)
        .unwrap_err();

    assert!(matches!(err, ConfigurationError::CredentialsNotFound { .. }));
    assert!(err.to_string().starts_with("Configuration file '"));
    assert!(err.to_string().ends_with("not found."));
}

#[test]
fn test_missing_key_names_file() {
    let temp = TempDir::new().unwrap();
    write_credentials(
        temp.path(),
        ".env.dev_etl_bitcoin_jd",
        "DB_HOST=h\nDB_PORT=5432\nDB_PASSWORD=p\nDB_NAME=d\n",
    );

    let err = EnvFileCredentials
        .credentials(&descriptor(temp.path()), Sgbd::Postgresql)
        .unwrap_err();

    assert!(matches!(err, ConfigurationError::MissingKey { key: "DB_USER", .. }));
    assert!(err.to_string().contains(".env.dev_etl_bitcoin_jd"));
}

#[test]
fn test_bad_port() {
    let temp = TempDir::new().unwrap();
    write_credentials(
        temp.path(),
        ".env.dev_etl_bitcoin_jd",
        "DB_HOST=h\nDB_PORT=99999\nDB_USER=u\nDB_PASSWORD=p\nDB_NAME=d\n",
    );

    let err = EnvFileCredentials
        .credentials(&descriptor(temp.path()), Sgbd::Postgresql)
        .unwrap_err();

    assert!(matches!(err, ConfigurationError::InvalidPort { value, .. } if value == "99999"));
}

#[tokio::test]
async fn test_gateway_with_missing_file_never_connects() {
    let temp = TempDir::new().unwrap();
    let connector = FakeConnector::healthy();
    let mut gateway = DatabaseGateway::new(
        descriptor(temp.path()),
        EnvFileCredentials,
        connector.clone(),
        WriteMode::Append,
    );

    let err = gateway.connect(5, Duration::ZERO).await.unwrap_err();

    assert!(matches!(
        err,
        EtlError::Configuration(ConfigurationError::CredentialsNotFound { .. })
    ));
    assert_eq!(connector.connect_attempts(), 0);
}
