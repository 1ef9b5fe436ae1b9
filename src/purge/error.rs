use thiserror::Error;

use crate::{state::StateError, stores::StoreError};

#[derive(Debug, Error)]
pub enum PurgeError {
    /// No job record exists; the caller should return to the entry point.
    #[error("No purge job is active")]
    NoActiveJob,

    /// A job record already exists and the caller did not ask to replace it.
    #[error("A purge job is already running")]
    JobAlreadyRunning,

    /// The presented token did not match the job's stored token (or had
    /// expired). The job state has been destroyed: a mismatched token means
    /// the chain's integrity can no longer be trusted, so the operator must
    /// restart from the entry point.
    #[error("Continuation token rejected; purge state destroyed, restart required")]
    AuthenticationFailed,

    /// The persisted record carried a stage no step should ever observe.
    /// The state has been destroyed and the caller returned to the start.
    #[error("Purge job was in an unexpected stage; state destroyed")]
    UnexpectedStage,

    /// The persisted sequence moved underneath this step: another
    /// invocation already processed this batch. The record is untouched.
    #[error("Step superseded by a newer checkpoint")]
    StaleStep,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    State(#[from] StateError),
}
