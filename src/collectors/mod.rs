// Scrape pipeline: fetch a posting page, extract its fields, fingerprint it
// and hand the outcome to a sink.

pub mod extract;
pub mod fetch;
pub mod runner;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::job::JobRecord;
use crate::models::scrap_error::ErrorRecord;

/// What one successfully fetched task turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    Job(JobRecord),
    Failed(ErrorRecord),
}

/// Destination for scrape outcomes. Implemented by the Postgres store; the
/// trait keeps the batch loop independent of a live database.
#[async_trait]
pub trait RecordSink: Send {
    /// Insert a job and its description atomically, returning the
    /// information row id. Fails with [`AppError::Duplicate`] when the
    /// fingerprint is already stored.
    async fn insert_job(&mut self, job: &JobRecord) -> Result<i32, AppError>;

    async fn insert_error(&mut self, error: &ErrorRecord) -> Result<i32, AppError>;
}

/// Hands out one sink per task-file batch and takes it back afterwards.
#[async_trait]
pub trait SinkProvider: Sync {
    type Sink: RecordSink;

    async fn open(&self) -> Result<Self::Sink, AppError>;

    async fn close(&self, sink: Self::Sink);
}
