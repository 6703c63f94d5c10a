use chrono::NaiveDate;
use sqlx::{Connection, PgConnection};

use crate::error::AppError;

/// A fully extracted posting, ready for `jobs_information` + `jobs_description`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub scrape_date: NaiveDate,
    pub job_title_scraped: String,
    pub job_name: String,
    pub company_name: String,
    pub job_location: String,
    pub job_level: String,
    pub job_type: String,
    pub job_category: String,
    pub job_sector: String,
    pub job_description: String,
    pub url: String,
    pub dedup_id: String,
}

impl JobRecord {
    /// Insert the information row and its description atomically, returning
    /// the `jobs_information` id. On any failure both rows are rolled back.
    pub async fn insert(&self, conn: &mut PgConnection) -> Result<i32, AppError> {
        let mut tx = conn.begin().await?;

        match self.insert_pair(&mut tx).await {
            Ok(id) => {
                tx.commit()
                    .await
                    .map_err(|e| AppError::from_insert(e, &self.dedup_id))?;
                Ok(id)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(url = %self.url, error = %rollback, "Rollback failed");
                }
                Err(AppError::from_insert(e, &self.dedup_id))
            }
        }
    }

    async fn insert_pair(&self, conn: &mut PgConnection) -> Result<i32, sqlx::Error> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO jobs_information (dedup_id, scrape_date, job_title_scraped, job_name, company_name, job_location, job_level, job_type, job_category, job_sector) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
        )
        .bind(&self.dedup_id)
        .bind(self.scrape_date)
        .bind(&self.job_title_scraped)
        .bind(&self.job_name)
        .bind(&self.company_name)
        .bind(&self.job_location)
        .bind(&self.job_level)
        .bind(&self.job_type)
        .bind(&self.job_category)
        .bind(&self.job_sector)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query("INSERT INTO jobs_description (job_information_id, description) VALUES ($1, $2)")
            .bind(id)
            .bind(&self.job_description)
            .execute(&mut *conn)
            .await?;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::test_support::sample_job;

    async fn count(conn: &mut PgConnection, sql: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(sql).fetch_one(conn).await.unwrap();
        n
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn inserts_linked_information_and_description(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let job = sample_job("https://example.com/1");

        let id = job.insert(&mut conn).await.unwrap();

        let (dedup_id, job_name): (String, String) =
            sqlx::query_as("SELECT dedup_id, job_name FROM jobs_information WHERE id = $1")
                .bind(id)
                .fetch_one(&mut *conn)
                .await
                .unwrap();
        assert_eq!(dedup_id, job.dedup_id);
        assert_eq!(job_name, "Data Engineer");

        let (description,): (String,) = sqlx::query_as(
            "SELECT description FROM jobs_description WHERE job_information_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        assert_eq!(description, job.job_description);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn second_insert_in_the_same_month_is_a_duplicate(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let job = sample_job("https://example.com/1");

        job.insert(&mut conn).await.unwrap();
        let err = job.insert(&mut conn).await.unwrap_err();

        assert!(err.is_duplicate(), "unexpected error: {err}");
        assert_eq!(count(&mut conn, "SELECT COUNT(*) FROM jobs_information").await, 1);
        assert_eq!(count(&mut conn, "SELECT COUNT(*) FROM jobs_description").await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn failed_description_insert_rolls_back_information_row(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        sqlx::query("ALTER TABLE jobs_description ADD CONSTRAINT short_description CHECK (length(description) < 5)")
            .execute(&mut *conn)
            .await
            .unwrap();

        let err = sample_job("https://example.com/1")
            .insert(&mut conn)
            .await
            .unwrap_err();

        assert!(!err.is_duplicate());
        assert_eq!(count(&mut conn, "SELECT COUNT(*) FROM jobs_information").await, 0);
        assert_eq!(count(&mut conn, "SELECT COUNT(*) FROM jobs_description").await, 0);
    }
}
