use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

/// One (date, job title, url) unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTask {
    pub date: NaiveDate,
    pub job_title: String,
    pub url: String,
}

/// `{"date": "YYYY-MM-DD", "job": {"<job title>": ["<url>", ...]}}`
#[derive(Debug, Deserialize)]
struct TaskFile {
    date: NaiveDate,
    job: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum TaskFileError {
    #[error("invalid task file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected exactly one job title, found {0}")]
    JobTitleCount(usize),
}

impl ScrapeTask {
    pub fn parse_file(contents: &str) -> Result<Vec<ScrapeTask>, TaskFileError> {
        let file: TaskFile = serde_json::from_str(contents)?;
        if file.job.len() != 1 {
            return Err(TaskFileError::JobTitleCount(file.job.len()));
        }

        let date = file.date;
        let tasks = file
            .job
            .into_iter()
            .flat_map(|(job_title, urls)| {
                urls.into_iter().map(move |url| ScrapeTask {
                    date,
                    job_title: job_title.clone(),
                    url,
                })
            })
            .collect();
        Ok(tasks)
    }

    /// Like [`ScrapeTask::parse_file`], but a file that cannot be decoded
    /// yields no tasks instead of failing the run.
    pub fn from_task_file(name: &str, contents: &str) -> Vec<ScrapeTask> {
        match Self::parse_file(contents) {
            Ok(tasks) => {
                tracing::info!(file = name, tasks = tasks.len(), "Task file decoded");
                tasks
            }
            Err(e) => {
                tracing::error!(file = name, error = %e, "Skipping undecodable task file");
                Vec::new()
            }
        }
    }
}
