//! The purge state machine.
//!
//! Each invocation advances the persisted job by exactly one batch and
//! returns either a continuation or the terminal summary. The controller
//! owns all writes to the job record; the transport layer only relays
//! tokens and continuation values.

use std::sync::Arc;

use chrono::Utc;

use super::{ContinuationTokenIssuer, PurgeError, STEP_TOKEN_PURPOSE};
use crate::{
    config::PurgeConfig,
    models::{Continuation, PurgeJob, PurgeSummary, Stage, StageProgress},
    state::{JobStateRepo, StateError},
    stores::{AccountStore, OrderStore},
};

/// Outcome of one processed step.
#[derive(Debug)]
pub enum StepOutcome {
    /// More work remains; re-invoke with the contained trigger.
    Continue(Continuation),
    /// Both stages exhausted. The job record no longer exists.
    Finished(PurgeSummary),
}

/// Read-only job view for the operator status surface.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobStatus {
    pub stage: Stage,
    pub batch_size: u32,
    pub orders: StageProgress,
    pub accounts: StageProgress,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl From<&PurgeJob> for JobStatus {
    fn from(job: &PurgeJob) -> Self {
        Self {
            stage: job.stage,
            batch_size: job.batch_size,
            orders: job.orders_progress(),
            accounts: job.accounts_progress(),
            started_at: job.started_at,
        }
    }
}

pub struct PurgeController {
    state: Arc<dyn JobStateRepo>,
    orders: Arc<dyn OrderStore>,
    accounts: Arc<dyn AccountStore>,
    issuer: ContinuationTokenIssuer,
    config: PurgeConfig,
}

impl PurgeController {
    pub fn new(
        state: Arc<dyn JobStateRepo>,
        orders: Arc<dyn OrderStore>,
        accounts: Arc<dyn AccountStore>,
        config: PurgeConfig,
    ) -> Self {
        Self {
            state,
            orders,
            accounts,
            issuer: ContinuationTokenIssuer::new(config.token_ttl_hours),
            config,
        }
    }

    /// Create a new purge job and return the trigger for step 1.
    ///
    /// Totals are snapshotted here, before any deletion, and never
    /// recomputed: they are best-effort estimates for the status surface.
    /// A store failure aborts with no state written.
    pub async fn start(&self, replace_existing: bool) -> Result<Continuation, PurgeError> {
        if self.state.load().await?.is_some() {
            if !replace_existing {
                return Err(PurgeError::JobAlreadyRunning);
            }
            tracing::warn!("Discarding existing purge job for a fresh start");
            self.state.clear().await?;
        }

        let orders_total = self.orders.count(&self.config.order_statuses).await?;
        let accounts_total = self
            .accounts
            .count_by_roles(&self.config.account_roles)
            .await?;

        let (secret, token) = self.issuer.issue(STEP_TOKEN_PURPOSE);
        let job = PurgeJob {
            token,
            stage: Stage::Orders,
            batch_size: self.config.batch_size,
            orders_processed: 0,
            orders_total,
            accounts_processed: 0,
            accounts_total,
            started_at: Utc::now(),
            seq: 0,
        };

        match self.state.create(&job).await {
            Ok(()) => {}
            // Another start won the race between our load and create.
            Err(StateError::Conflict) => return Err(PurgeError::JobAlreadyRunning),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            orders_total,
            accounts_total,
            batch_size = self.config.batch_size,
            "Purge job created"
        );

        Ok(Continuation {
            stage: Stage::Orders,
            token: secret,
        })
    }

    /// Process one batch of the active job.
    pub async fn process_step(&self, presented_token: &str) -> Result<StepOutcome, PurgeError> {
        let Some(mut job) = self.state.load().await? else {
            return Err(PurgeError::NoActiveJob);
        };

        if !self
            .issuer
            .verify(presented_token, &job.token, STEP_TOKEN_PURPOSE)
        {
            // Fail closed: a mismatched or expired token means the chain's
            // integrity can no longer be trusted.
            tracing::warn!(stage = %job.stage, "Continuation token rejected; destroying purge state");
            self.state.clear().await?;
            return Err(PurgeError::AuthenticationFailed);
        }

        match job.stage {
            Stage::Orders => {
                let fetched = self.delete_order_batch(&job).await?;
                job.orders_processed += fetched as u64;
                let exhausted = fetched < job.batch_size;
                if exhausted {
                    job.stage = Stage::Accounts;
                }
                self.checkpoint(&mut job).await?;

                tracing::info!(
                    processed = job.orders_processed,
                    total = job.orders_total,
                    exhausted,
                    "Order batch complete"
                );

                Ok(StepOutcome::Continue(Continuation {
                    stage: job.stage,
                    // The raw secret is not stored; relay the one the
                    // caller just proved knowledge of.
                    token: presented_token.to_string(),
                }))
            }
            Stage::Accounts => {
                let fetched = self.delete_account_batch(&job).await?;
                job.accounts_processed += fetched as u64;

                if fetched < job.batch_size {
                    // Terminal: the record is destroyed exactly when the
                    // job reaches Done; nothing survives full completion.
                    job.stage = Stage::Done;
                    self.state.clear().await?;

                    let summary = PurgeSummary {
                        orders_processed: job.orders_processed,
                        accounts_processed: job.accounts_processed,
                        started_at: job.started_at,
                        finished_at: Utc::now(),
                    };
                    tracing::info!(
                        orders = summary.orders_processed,
                        accounts = summary.accounts_processed,
                        "Purge complete"
                    );
                    return Ok(StepOutcome::Finished(summary));
                }

                self.checkpoint(&mut job).await?;

                tracing::info!(
                    processed = job.accounts_processed,
                    total = job.accounts_total,
                    "Account batch complete"
                );

                Ok(StepOutcome::Continue(Continuation {
                    stage: Stage::Accounts,
                    token: presented_token.to_string(),
                }))
            }
            Stage::Done => {
                // A persisted record should never carry this stage; reset
                // rather than propagate partial corruption.
                tracing::error!("Persisted purge job in Done stage; destroying state");
                self.state.clear().await?;
                Err(PurgeError::UnexpectedStage)
            }
        }
    }

    /// Read-only view of the active job, if any.
    pub async fn status(&self) -> Result<Option<JobStatus>, PurgeError> {
        Ok(self.state.load().await?.as_ref().map(JobStatus::from))
    }

    /// Persist the mutated job, bumping the sequence and rejecting the
    /// write if another step already checkpointed past us.
    async fn checkpoint(&self, job: &mut PurgeJob) -> Result<(), PurgeError> {
        let expected = job.seq;
        job.seq += 1;
        match self.state.update(job, expected).await {
            Ok(()) => Ok(()),
            Err(StateError::Conflict) => Err(PurgeError::StaleStep),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch and delete one batch of orders, returning the fetched count.
    ///
    /// Individual delete failures are logged and skipped so one bad record
    /// cannot wedge the whole job; an already-deleted order is a no-op.
    async fn delete_order_batch(&self, job: &PurgeJob) -> Result<u32, PurgeError> {
        let ids = self
            .orders
            .fetch_batch(&self.config.order_statuses, job.batch_size)
            .await?;

        for id in &ids {
            if let Err(e) = self.orders.delete_permanently(*id).await {
                tracing::warn!(order_id = id, error = %e, "Failed to delete order; continuing batch");
            }
        }

        Ok(ids.len() as u32)
    }

    async fn delete_account_batch(&self, job: &PurgeJob) -> Result<u32, PurgeError> {
        let ids = self
            .accounts
            .fetch_batch(&self.config.account_roles, job.batch_size)
            .await?;

        for id in &ids {
            if let Err(e) = self.accounts.delete(*id).await {
                tracing::warn!(account_id = id, error = %e, "Failed to delete account; continuing batch");
            }
        }

        Ok(ids.len() as u32)
    }
}
