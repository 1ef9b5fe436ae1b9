use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase of a purge job.
///
/// Stages advance strictly in declaration order: `Orders` → `Accounts` →
/// `Done`. A job never moves backwards, and the persisted stage is the
/// single source of truth for sequencing across invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Deleting orders in batches.
    Orders,
    /// Orders exhausted; deleting accounts in batches.
    Accounts,
    /// Both collections exhausted. A job in this stage is destroyed, so a
    /// persisted record should never carry it.
    Done,
}

impl Stage {
    /// Convert to string for storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::Accounts => "accounts",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The sticky credential gating every step of a purge chain.
///
/// Issued once at job creation and stored with the job; each step presents
/// the raw secret, which is hashed and compared literally against the
/// stored hash. The expiry is measured in hours so a multi-hour purge
/// never hits a "link expired" failure mid-chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuationToken {
    /// SHA-256 hash of the secret. The raw secret lives only in the
    /// continuation triggers, never in the persisted record.
    pub secret_hash: String,
    /// What the token authorizes (e.g. "purge-step").
    pub purpose: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// The singleton persisted purge job record.
///
/// Exactly one of these may exist at a time. It is created on the initiating
/// trigger, mutated in place once per processed batch, and destroyed when
/// the job completes or its token fails verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeJob {
    pub token: ContinuationToken,
    pub stage: Stage,
    pub batch_size: u32,
    pub orders_processed: u64,
    /// Snapshot taken once at creation. Best-effort: the underlying
    /// collection may be mutated mid-run, so `orders_processed` can drift
    /// past it.
    pub orders_total: u64,
    pub accounts_processed: u64,
    pub accounts_total: u64,
    pub started_at: DateTime<Utc>,
    /// Optimistic concurrency sequence. Incremented on every persisted
    /// step; a step whose expected prior value no longer matches the
    /// record is rejected instead of double-processing a batch.
    pub seq: u64,
}

impl PurgeJob {
    pub fn orders_progress(&self) -> StageProgress {
        StageProgress {
            processed: self.orders_processed,
            total: self.orders_total,
        }
    }

    pub fn accounts_progress(&self) -> StageProgress {
        StageProgress {
            processed: self.accounts_processed,
            total: self.accounts_total,
        }
    }
}

/// Per-stage progress counters exposed on the status surface.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StageProgress {
    pub processed: u64,
    /// Point-in-time estimate from job creation, not a live count.
    pub total: u64,
}

/// The signal used to invoke the next step of a chained job.
///
/// The controller returns this instead of driving any particular transport;
/// the transport layer decides how to turn it into a re-invocation (the
/// HTTP layer answers with a `303 See Other` to the step endpoint).
#[derive(Debug, Clone, Serialize)]
pub struct Continuation {
    /// Stage the next step will process.
    pub stage: Stage,
    /// Token secret to present on the next step.
    pub token: String,
}

/// Final accounting returned when a purge chain completes.
#[derive(Debug, Clone, Serialize)]
pub struct PurgeSummary {
    pub orders_processed: u64,
    pub accounts_processed: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
