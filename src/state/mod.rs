//! Persistence for the singleton purge job record.
//!
//! The job record is the only shared mutable state in the system. It is
//! stored under a fixed, versioned key; bumping [`JOB_STATE_KEY`] orphans
//! any in-flight job from a prior release, which is acceptable because
//! jobs are short-lived operational actions rather than long-term data.
//!
//! Updates are guarded by an optimistic sequence check so a stale or
//! concurrently-dispatched step is rejected instead of double-processing
//! a batch.

mod memory;
#[cfg(feature = "database-sqlite")]
mod sqlite;

use async_trait::async_trait;
pub use memory::InMemoryJobStateRepo;
#[cfg(feature = "database-sqlite")]
pub use sqlite::SqliteJobStateRepo;
use thiserror::Error;

use crate::models::PurgeJob;

/// Storage key for the persisted job record. Versioned: a key change
/// invalidates in-flight jobs from prior versions.
pub const JOB_STATE_KEY: &str = "purge_job:v1";

#[derive(Debug, Error)]
pub enum StateError {
    /// A create found an existing record, or an update's expected sequence
    /// no longer matched the persisted record.
    #[error("Job state conflict")]
    Conflict,

    #[error("Job state serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[cfg(feature = "database-sqlite")]
    #[error("Job state database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Job state error: {0}")]
    Internal(String),
}

pub type StateResult<T> = Result<T, StateError>;

/// Repository for the singleton purge job record.
///
/// Injected into the controller so the engine is independent of where the
/// record lives; tests use the in-memory implementation.
#[async_trait]
pub trait JobStateRepo: Send + Sync {
    /// Load the active job record, if one exists.
    async fn load(&self) -> StateResult<Option<PurgeJob>>;

    /// Persist a new job record. Fails with [`StateError::Conflict`] if a
    /// record already exists.
    async fn create(&self, job: &PurgeJob) -> StateResult<()>;

    /// Replace the record, but only if the persisted sequence still equals
    /// `expected_seq`. Fails with [`StateError::Conflict`] otherwise,
    /// leaving the record untouched.
    async fn update(&self, job: &PurgeJob, expected_seq: u64) -> StateResult<()>;

    /// Destroy the record. Clearing an absent record is a no-op.
    async fn clear(&self) -> StateResult<()>;
}
