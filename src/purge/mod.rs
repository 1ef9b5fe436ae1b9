//! The purge engine: a resumable, checkpointed, batch-paced deletion
//! protocol.
//!
//! A purge of unbounded-size collections is decomposed into a chain of
//! short, independent steps. Each step processes one bounded batch,
//! persists progress through the job-state repository, and returns a
//! continuation value the transport layer turns into the next trigger.
//! Every step is gated by a sticky token issued once per job, so a stale
//! or forged trigger cannot re-enter or corrupt a job.

mod controller;
mod error;
mod token;

pub use controller::{JobStatus, PurgeController, StepOutcome};
pub use error::PurgeError;
pub use token::{ContinuationTokenIssuer, STEP_TOKEN_PURPOSE};
