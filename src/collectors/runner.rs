use std::ops::AddAssign;

use anyhow::Context;

use super::extract::{self, Extraction};
use super::fetch::PageFetcher;
use super::{RecordSink, ScrapeOutcome, SinkProvider};
use crate::config::Config;
use crate::db::{self, PgConnector};
use crate::fingerprint::fingerprint;
use crate::models::job::JobRecord;
use crate::models::scrap_error::ErrorRecord;
use crate::models::task::ScrapeTask;
use crate::source::TaskSource;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub found: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub errors_recorded: usize,
    pub failed: usize,
}

impl AddAssign for BatchSummary {
    fn add_assign(&mut self, other: Self) {
        self.found += other.found;
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.errors_recorded += other.errors_recorded;
        self.failed += other.failed;
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub tasks: usize,
    /// Tasks whose page could not be fetched (deleted, closed, rate limited).
    pub dropped: usize,
    pub stored: BatchSummary,
}

/// Prepare the schema if asked, then process every task file against
/// Postgres.
pub async fn run(config: &Config, source: &dyn TaskSource) -> anyhow::Result<RunSummary> {
    let fetcher = PageFetcher::new(&config.fetch)?;

    if config.ensure_schema {
        tracing::info!("Creating tables if they do not exist...");
        db::init_schema(&config.db)
            .await
            .context("preparing database schema")?;
    }

    process_files(&fetcher, source, &PgConnector::new(&config.db)).await
}

/// Process every task file: scrape its tasks, then store the outcomes in a
/// sink opened for that file alone and closed before the next one. Files that
/// cannot be read or decoded, and batches with nothing to store, open no sink.
pub async fn process_files<P: SinkProvider>(
    fetcher: &PageFetcher,
    source: &dyn TaskSource,
    sinks: &P,
) -> anyhow::Result<RunSummary> {
    let files = source.list().await.context("listing task files")?;
    tracing::info!(files = files.len(), "Task files to process");

    let mut summary = RunSummary::default();
    for name in files {
        let contents = match source.download(&name).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::error!(file = %name, error = %e, "Failed to read task file");
                continue;
            }
        };
        summary.files += 1;

        let tasks = ScrapeTask::from_task_file(&name, &contents);
        if tasks.is_empty() {
            continue;
        }

        let outcomes = scrape_tasks(fetcher, &tasks).await;
        summary.tasks += tasks.len();
        summary.dropped += tasks.len() - outcomes.len();
        if outcomes.is_empty() {
            continue;
        }

        let mut sink = sinks.open().await.context("connecting to database")?;
        let batch = persist_outcomes(&mut sink, outcomes).await;
        sinks.close(sink).await;

        tracing::info!(
            file = %name,
            found = batch.found,
            inserted = batch.inserted,
            duplicates = batch.duplicates,
            errors = batch.errors_recorded,
            failed = batch.failed,
            "Task file processed"
        );
        summary.stored += batch;
    }

    Ok(summary)
}

/// Fetch, extract and fingerprint each task in order. Tasks whose page
/// cannot be fetched produce no outcome.
pub async fn scrape_tasks(fetcher: &PageFetcher, tasks: &[ScrapeTask]) -> Vec<ScrapeOutcome> {
    let mut outcomes = Vec::with_capacity(tasks.len());
    for task in tasks {
        let Some(document) = fetcher.fetch(&task.url).await else {
            continue;
        };
        outcomes.push(build_outcome(task, extract::extract(&document)));
    }
    outcomes
}

fn build_outcome(task: &ScrapeTask, extraction: Extraction) -> ScrapeOutcome {
    match extraction {
        Extraction::Complete(posting) => {
            let dedup_id = fingerprint(
                task.date,
                &posting.job_name,
                &posting.company_name,
                &posting.job_location,
            );
            ScrapeOutcome::Job(JobRecord {
                scrape_date: task.date,
                job_title_scraped: task.job_title.clone(),
                job_name: posting.job_name,
                company_name: posting.company_name,
                job_location: posting.job_location,
                job_level: posting.job_level,
                job_type: posting.job_type,
                job_category: posting.job_category,
                job_sector: posting.job_sector,
                job_description: posting.job_description,
                url: task.url.clone(),
                dedup_id,
            })
        }
        Extraction::Partial { fields, missing } => {
            tracing::warn!(
                url = %task.url,
                job_name = fields.job_name.as_deref().unwrap_or_default(),
                missing = %missing.join(", "),
                "Job with missing fields"
            );
            ScrapeOutcome::Failed(ErrorRecord::from_missing(&missing, &task.url))
        }
    }
}

/// Write each outcome to `sink`. Failures are counted and logged, never
/// propagated, so one bad record does not stop the batch.
pub async fn persist_outcomes(
    sink: &mut dyn RecordSink,
    outcomes: Vec<ScrapeOutcome>,
) -> BatchSummary {
    let mut summary = BatchSummary {
        found: outcomes.len(),
        ..BatchSummary::default()
    };

    for outcome in outcomes {
        match outcome {
            ScrapeOutcome::Job(job) => match sink.insert_job(&job).await {
                Ok(id) => {
                    summary.inserted += 1;
                    tracing::info!(id, url = %job.url, "Job inserted");
                }
                Err(e) if e.is_duplicate() => {
                    summary.duplicates += 1;
                    tracing::info!(
                        dedup_id = %job.dedup_id,
                        url = %job.url,
                        "Job already ingested this month, skipping"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(url = %job.url, error = %e, "Failed to insert job data");
                }
            },
            ScrapeOutcome::Failed(error) => match sink.insert_error(&error).await {
                Ok(_) => {
                    summary.errors_recorded += 1;
                    tracing::info!(url = %error.url, missing = %error.error_message, "Scrape error recorded");
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(url = %error.url, error = %e, "Failed to insert error record");
                }
            },
        }
    }

    summary
}
