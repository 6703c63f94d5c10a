//! Fixtures and doubles shared by the unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::collectors::{RecordSink, SinkProvider};
use crate::config::FetchConfig;
use crate::error::AppError;
use crate::fingerprint::fingerprint;
use crate::models::job::JobRecord;
use crate::models::scrap_error::ErrorRecord;

pub const POSTING_HTML: &str = r#"<!DOCTYPE html>
<html lang="fr">
<body>
  <main>
    <section class="top-card-layout">
      <h1 class="top-card-layout__title">Data Engineer</h1>
      <h4 class="top-card-layout__second-subline">
        <span class="topcard__flavor">
          <a class="topcard__org-name-link" href="https://example.com/company/acme">
            Acme
          </a>
        </span>
        <span class="topcard__flavor topcard__flavor--bullet">
          Paris, Île-de-France, France
        </span>
      </h4>
    </section>
    <div class="decorated-job-posting__details">
      <div class="show-more-less-html__markup">
        <p>Rejoignez l’équipe data.</p>
        <p>Vous construirez des pipelines "robustes".</p>
        <ul><li>Python</li><li>SQL</li></ul>
      </div>
      <ul class="description__job-criteria-list">
        <li class="description__job-criteria-item">
          <h3 class="description__job-criteria-subheader">Niveau hiérarchique</h3>
          <span class="description__job-criteria-text description__job-criteria-text--criteria">
            Premier emploi
          </span>
        </li>
        <li class="description__job-criteria-item">
          <h3 class="description__job-criteria-subheader">Type d’emploi</h3>
          <span class="description__job-criteria-text description__job-criteria-text--criteria">
            Temps plein
          </span>
        </li>
        <li class="description__job-criteria-item">
          <h3 class="description__job-criteria-subheader">Fonction</h3>
          <span class="description__job-criteria-text description__job-criteria-text--criteria">
            Informatique
          </span>
        </li>
        <li class="description__job-criteria-item">
          <h3 class="description__job-criteria-subheader">Secteurs</h3>
          <span class="description__job-criteria-text description__job-criteria-text--criteria">
            Services et conseil en informatique
          </span>
        </li>
      </ul>
    </div>
  </main>
</body>
</html>"#;

pub const ENGLISH_POSTING_HTML: &str = r#"<html><body>
  <section class="top-card-layout">
    <h1 class="top-card-layout__title">Backend Engineer</h1>
    <span class="topcard__flavor"><a class="topcard__org-name-link" href="/c">Initech</a></span>
    <span class="topcard__flavor topcard__flavor--bullet">Austin, TX</span>
  </section>
  <div class="decorated-job-posting__details">
    <div class="show-more-less-html__markup">Build APIs.</div>
    <ul>
      <li class="description__job-criteria-item">
        <h3 class="description__job-criteria-subheader">Seniority level</h3>
        <span class="description__job-criteria-text description__job-criteria-text--criteria">Entry level</span>
      </li>
      <li class="description__job-criteria-item">
        <h3 class="description__job-criteria-subheader">Employment type</h3>
        <span class="description__job-criteria-text description__job-criteria-text--criteria">Full-time</span>
      </li>
      <li class="description__job-criteria-item">
        <h3 class="description__job-criteria-subheader">Job function</h3>
        <span class="description__job-criteria-text description__job-criteria-text--criteria">Engineering</span>
      </li>
      <li class="description__job-criteria-item">
        <h3 class="description__job-criteria-subheader">Industries</h3>
        <span class="description__job-criteria-text description__job-criteria-text--criteria">Software Development</span>
      </li>
    </ul>
  </div>
</body></html>"#;

/// Search results page served instead of a posting once it is closed.
pub const CLOSED_HTML: &str =
    r#"<html><body><div class="base-serp-page"><h1>Jobs in Paris</h1></div></body></html>"#;

/// The posting page with the company link emptied.
pub fn posting_without_company() -> String {
    POSTING_HTML.replace(
        r#"<a class="topcard__org-name-link" href="https://example.com/company/acme">
            Acme
          </a>"#,
        "",
    )
}

pub fn fast_fetch_config() -> FetchConfig {
    FetchConfig {
        max_attempts: 10,
        base_delay_ms: 1,
        timeout_secs: 5,
        user_agent: "jobstats-scraper-tests".to_string(),
    }
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_server(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn sample_job(url: &str) -> JobRecord {
    let scrape_date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    JobRecord {
        scrape_date,
        job_title_scraped: "Data Engineer".to_string(),
        job_name: "Data Engineer".to_string(),
        company_name: "Acme".to_string(),
        job_location: "Paris".to_string(),
        job_level: "Premier emploi".to_string(),
        job_type: "Temps plein".to_string(),
        job_category: "Informatique".to_string(),
        job_sector: "Services et conseil en informatique".to_string(),
        job_description: "Rejoignez l'équipe data.".to_string(),
        url: url.to_string(),
        dedup_id: fingerprint(scrape_date, "Data Engineer", "Acme", "Paris"),
    }
}

/// In-memory stand-in for the three tables, enforcing `dedup_id` uniqueness.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub jobs: Vec<JobRecord>,
    /// (job_information_id, description)
    pub descriptions: Vec<(i32, String)>,
    pub errors: Vec<ErrorRecord>,
    /// Inserts for these URLs fail with a database error.
    pub fail_urls: Vec<String>,
}

impl MemorySink {
    fn check_failure(&self, url: &str) -> Result<(), AppError> {
        if self.fail_urls.iter().any(|u| u == url) {
            return Err(AppError::Database(sqlx::Error::Protocol(
                "connection reset".to_string(),
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn insert_job(&mut self, job: &JobRecord) -> Result<i32, AppError> {
        self.check_failure(&job.url)?;
        if self.jobs.iter().any(|j| j.dedup_id == job.dedup_id) {
            return Err(AppError::Duplicate {
                dedup_id: job.dedup_id.clone(),
            });
        }
        self.jobs.push(job.clone());
        let id = self.jobs.len() as i32;
        self.descriptions.push((id, job.job_description.clone()));
        Ok(id)
    }

    async fn insert_error(&mut self, error: &ErrorRecord) -> Result<i32, AppError> {
        self.check_failure(&error.url)?;
        self.errors.push(error.clone());
        Ok(self.errors.len() as i32)
    }
}

/// Hands out a fresh [`MemorySink`] per batch and keeps every closed one.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    /// "open" / "close", in call order.
    pub events: Mutex<Vec<&'static str>>,
    pub closed: Mutex<Vec<MemorySink>>,
}

#[async_trait]
impl SinkProvider for MemoryProvider {
    type Sink = MemorySink;

    async fn open(&self) -> Result<MemorySink, AppError> {
        self.events.lock().unwrap().push("open");
        Ok(MemorySink::default())
    }

    async fn close(&self, sink: MemorySink) {
        self.events.lock().unwrap().push("close");
        self.closed.lock().unwrap().push(sink);
    }
}
