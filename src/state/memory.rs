//! In-memory job-state repository.
//!
//! Used in local mode (no database configured) and by tests. A process
//! restart abandons the job, which local mode accepts.

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{JobStateRepo, StateError, StateResult};
use crate::models::PurgeJob;

#[derive(Default)]
pub struct InMemoryJobStateRepo {
    record: Mutex<Option<PurgeJob>>,
}

impl InMemoryJobStateRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStateRepo for InMemoryJobStateRepo {
    async fn load(&self) -> StateResult<Option<PurgeJob>> {
        Ok(self.record.lock().clone())
    }

    async fn create(&self, job: &PurgeJob) -> StateResult<()> {
        let mut record = self.record.lock();
        if record.is_some() {
            return Err(StateError::Conflict);
        }
        *record = Some(job.clone());
        Ok(())
    }

    async fn update(&self, job: &PurgeJob, expected_seq: u64) -> StateResult<()> {
        let mut record = self.record.lock();
        match record.as_ref() {
            Some(current) if current.seq == expected_seq => {
                *record = Some(job.clone());
                Ok(())
            }
            _ => Err(StateError::Conflict),
        }
    }

    async fn clear(&self) -> StateResult<()> {
        *self.record.lock() = None;
        Ok(())
    }
}
