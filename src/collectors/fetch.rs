use anyhow::Context;
use reqwest::StatusCode;
use scraper::Html;
use tracing::Instrument;

use super::extract;
use crate::config::FetchConfig;
use crate::retry::{self, BackoffPolicy, RetryError};

/// A fetched posting page, parsed once when the body arrives.
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("rate limited (429 Too Many Requests)")]
    RateLimited,

    #[error("http status {0}")]
    Status(StatusCode),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl FetchError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::RateLimited)
    }
}

pub struct PageFetcher {
    client: reqwest::Client,
    backoff: BackoffPolicy,
}

impl PageFetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            backoff: config.backoff(),
        })
    }

    /// Fetch a posting page. Only 429 answers are retried; any other failure,
    /// a closed listing, or running out of attempts yields `None`.
    pub async fn fetch(&self, url: &str) -> Option<Document> {
        let span = tracing::info_span!("fetch_page", url);
        async {
            let result = retry::with_backoff(
                &self.backoff,
                |_| self.get_once(url),
                FetchError::is_rate_limited,
            )
            .await;

            match result {
                Ok(document) if extract::is_listing_closed(&document) => {
                    tracing::warn!("Page not accessible, applications are closed");
                    None
                }
                Ok(document) => {
                    tracing::info!("Page fetched");
                    Some(document)
                }
                Err(RetryError::Permanent(e)) => {
                    tracing::warn!(error = %e, "Job offer not found, maybe deleted");
                    None
                }
                Err(RetryError::Exhausted { attempts, last }) => {
                    tracing::error!(attempts, error = %last, "Failed to retrieve page after retries");
                    None
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn get_once(&self, url: &str) -> Result<Document, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        Ok(Document::parse(&body))
    }
}
