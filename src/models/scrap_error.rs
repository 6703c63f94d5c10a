use sqlx::PgConnection;

use crate::error::AppError;

/// A posting that could not be fully extracted, kept for later inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Comma-joined names of the fields that were not found.
    pub error_message: String,
    pub url: String,
}

impl ErrorRecord {
    pub fn from_missing(missing: &[&str], url: &str) -> Self {
        Self {
            error_message: missing.join(", "),
            url: url.to_string(),
        }
    }

    pub async fn insert(&self, conn: &mut PgConnection) -> Result<i32, AppError> {
        let (id,): (i32,) =
            sqlx::query_as("INSERT INTO scrap_errors (error_message, url) VALUES ($1, $2) RETURNING id")
                .bind(&self.error_message)
                .bind(&self.url)
                .fetch_one(conn)
                .await?;
        Ok(id)
    }
}
