use std::io::Write;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{ConnectOptions, Connection, PgConnection};
use tempfile::NamedTempFile;

use crate::collectors::{RecordSink, SinkProvider};
use crate::config::DbConfig;
use crate::error::AppError;
use crate::models::job::JobRecord;
use crate::models::scrap_error::ErrorRecord;

/// Open a mutual-TLS connection. The PEM material is written to temporary
/// files that only live until the handshake is over, whatever its outcome.
pub async fn connect(config: &DbConfig) -> Result<PgConnection, AppError> {
    let root_cert = pem_file(&config.root_cert)?;
    let client_cert = pem_file(&config.client_cert)?;
    let client_key = pem_file(&config.client_key)?;

    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.name)
        .ssl_mode(PgSslMode::VerifyCa)
        .ssl_root_cert(root_cert.path())
        .ssl_client_cert(client_cert.path())
        .ssl_client_key(client_key.path());

    let connected = options.connect().await;
    drop((root_cert, client_cert, client_key));

    match connected {
        Ok(conn) => {
            tracing::info!(database = %config.name, host = %config.host, "Connection established");
            Ok(conn)
        }
        Err(e) => {
            tracing::error!(database = %config.name, host = %config.host, error = %e, "Failed to establish connection");
            Err(e.into())
        }
    }
}

fn pem_file(contents: &str) -> Result<NamedTempFile, AppError> {
    let mut file = tempfile::Builder::new()
        .prefix("pg-")
        .suffix(".pem")
        .tempfile()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Create the job tables if they do not exist yet.
pub async fn ensure_schema(conn: &mut PgConnection) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(conn).await?;
    tracing::info!("Database tables ready");
    Ok(())
}

pub async fn close(conn: PgConnection) {
    match conn.close().await {
        Ok(()) => tracing::info!("Connection closed"),
        Err(e) => tracing::warn!(error = %e, "Failed to close connection cleanly"),
    }
}

/// Connect, ensure the schema and disconnect again.
pub async fn init_schema(config: &DbConfig) -> Result<(), AppError> {
    let mut conn = connect(config).await?;
    let result = ensure_schema(&mut conn).await;
    close(conn).await;
    result
}

/// Postgres-backed [`RecordSink`] holding one connection for a batch.
pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    pub fn new(conn: PgConnection) -> Self {
        Self { conn }
    }

    pub async fn connect(config: &DbConfig) -> Result<Self, AppError> {
        Ok(Self::new(connect(config).await?))
    }

    pub async fn close(self) {
        close(self.conn).await;
    }
}

#[async_trait]
impl RecordSink for PgStore {
    async fn insert_job(&mut self, job: &JobRecord) -> Result<i32, AppError> {
        job.insert(&mut self.conn).await
    }

    async fn insert_error(&mut self, error: &ErrorRecord) -> Result<i32, AppError> {
        error.insert(&mut self.conn).await
    }
}

/// Opens a fresh mutual-TLS connection for every batch.
pub struct PgConnector<'a> {
    config: &'a DbConfig,
}

impl<'a> PgConnector<'a> {
    pub fn new(config: &'a DbConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl<'a> SinkProvider for PgConnector<'a> {
    type Sink = PgStore;

    async fn open(&self) -> Result<PgStore, AppError> {
        PgStore::connect(self.config).await
    }

    async fn close(&self, sink: PgStore) {
        sink.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pem_files_hold_the_material_and_vanish_on_drop() {
        let file = pem_file("-----BEGIN CERTIFICATE-----\nabc\n").unwrap();
        let path = file.path().to_path_buf();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "-----BEGIN CERTIFICATE-----\nabc\n"
        );
        assert!(path.extension().is_some_and(|ext| ext == "pem"));

        drop(file);
        assert!(!path.exists());
    }
}
