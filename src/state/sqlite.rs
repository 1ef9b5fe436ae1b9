//! SQLite-backed job-state repository.
//!
//! One row per [`JOB_STATE_KEY`]. The sequence lives in its own column so
//! the optimistic check happens in the `UPDATE ... WHERE seq = ?` predicate
//! and never races a concurrent writer.

use chrono::Utc;
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use super::{JOB_STATE_KEY, JobStateRepo, StateError, StateResult};
use crate::models::PurgeJob;
use async_trait::async_trait;

pub struct SqliteJobStateRepo {
    pool: SqlitePool,
}

impl SqliteJobStateRepo {
    /// Wrap an existing pool. Primarily useful for testing.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (and if needed create) the database file and ensure the schema.
    pub async fn connect(path: &str, create_if_missing: bool) -> StateResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create_if_missing);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let repo = Self::new(pool);
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> StateResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_state (
                key TEXT PRIMARY KEY,
                seq INTEGER NOT NULL,
                record TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl JobStateRepo for SqliteJobStateRepo {
    async fn load(&self) -> StateResult<Option<PurgeJob>> {
        let row = sqlx::query("SELECT record FROM job_state WHERE key = ?")
            .bind(JOB_STATE_KEY)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let record: String = row.get("record");
                Ok(Some(serde_json::from_str(&record)?))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, job: &PurgeJob) -> StateResult<()> {
        let record = serde_json::to_string(job)?;
        let result = sqlx::query(
            r#"
            INSERT INTO job_state (key, seq, record, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO NOTHING
            "#,
        )
        .bind(JOB_STATE_KEY)
        .bind(job.seq as i64)
        .bind(record)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StateError::Conflict);
        }
        Ok(())
    }

    async fn update(&self, job: &PurgeJob, expected_seq: u64) -> StateResult<()> {
        let record = serde_json::to_string(job)?;
        let result = sqlx::query(
            r#"
            UPDATE job_state
            SET seq = ?, record = ?, updated_at = ?
            WHERE key = ? AND seq = ?
            "#,
        )
        .bind(job.seq as i64)
        .bind(record)
        .bind(Utc::now().to_rfc3339())
        .bind(JOB_STATE_KEY)
        .bind(expected_seq as i64)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StateError::Conflict);
        }
        Ok(())
    }

    async fn clear(&self) -> StateResult<()> {
        sqlx::query("DELETE FROM job_state WHERE key = ?")
            .bind(JOB_STATE_KEY)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
