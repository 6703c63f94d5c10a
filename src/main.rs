mod collectors;
mod config;
mod db;
mod error;
mod fingerprint;
mod models;
mod retry;
mod source;
#[cfg(test)]
mod test_support;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::collectors::runner;
use crate::config::{Command, Config, LogFormat};
use crate::source::DirectorySource;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobstats_scraper=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    match config.resolved_command() {
        Command::InitSchema => {
            tracing::info!("Creating tables if they do not exist...");
            db::init_schema(&config.db).await?;
        }
        Command::Run { tasks_dir } => {
            tracing::info!(tasks_dir = %tasks_dir.display(), "Starting scrape run");
            let source = DirectorySource::new(tasks_dir);
            let summary = runner::run(&config, &source).await?;
            tracing::info!(
                files = summary.files,
                tasks = summary.tasks,
                dropped = summary.dropped,
                found = summary.stored.found,
                inserted = summary.stored.inserted,
                duplicates = summary.stored.duplicates,
                errors = summary.stored.errors_recorded,
                failed = summary.stored.failed,
                "Scrape run complete"
            );
        }
    }

    Ok(())
}
