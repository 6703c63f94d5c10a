#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The posting's fingerprint is already stored for this month.
    #[error("Already ingested this month: {dedup_id}")]
    Duplicate { dedup_id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Classify an error raised while inserting a job. A unique violation on
    /// `dedup_id` is the dedup signal, everything else stays a database error.
    pub fn from_insert(err: sqlx::Error, dedup_id: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
            && db_err
                .constraint()
                .is_none_or(|constraint| constraint.contains("dedup_id"))
        {
            return AppError::Duplicate {
                dedup_id: dedup_id.to_string(),
            };
        }
        AppError::Database(err)
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, AppError::Duplicate { .. })
    }
}
