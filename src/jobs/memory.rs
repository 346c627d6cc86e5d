use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::job::{JobStatus, ScheduledJob};
use super::store::{JobCompletion, JobStore};
use super::JobError;

/// In-memory [`JobStore`] for development and testing.
///
/// Jobs are stored in a `Vec` behind a mutex. Not durable — all jobs are
/// lost on restart. The mutex makes `claim` atomic across concurrent
/// pollers.
#[derive(Clone, Default)]
pub struct MemoryJobStore {
    jobs: Arc<Mutex<Vec<ScheduledJob>>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job: &ScheduledJob) -> Result<(), JobError> {
        let mut jobs = self.jobs.lock().await;
        jobs.push(job.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ScheduledJob>, JobError> {
        let jobs = self.jobs.lock().await;
        Ok(jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn find_due(&self, now: OffsetDateTime) -> Result<Vec<ScheduledJob>, JobError> {
        let jobs = self.jobs.lock().await;
        let mut due: Vec<_> = jobs
            .iter()
            .filter(|j| j.status == JobStatus::Pending && j.scheduled_for <= now)
            .cloned()
            .collect();
        due.sort_by_key(|j| j.scheduled_for);
        Ok(due)
    }

    async fn claim(&self, id: Uuid) -> Result<Option<ScheduledJob>, JobError> {
        let mut jobs = self.jobs.lock().await;
        match jobs.iter_mut().find(|j| j.id == id) {
            Some(job) if job.status == JobStatus::Pending => {
                job.status = JobStatus::Processing;
                Ok(Some(job.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn write_result(&self, id: Uuid, completion: JobCompletion) -> Result<(), JobError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or(JobError::NotFound(id))?;

        match completion {
            JobCompletion::Sent { result, sent_at } => {
                job.status = JobStatus::Sent;
                job.result = result;
                job.sent_at = Some(sent_at);
            }
            JobCompletion::Failed { error } => {
                job.status = JobStatus::Failed;
                job.error_message = Some(error);
            }
        }
        Ok(())
    }

    async fn cancel(&self, id: Uuid, sender: &str) -> Result<Option<ScheduledJob>, JobError> {
        let mut jobs = self.jobs.lock().await;
        match jobs
            .iter_mut()
            .find(|j| j.id == id && j.from_email == sender)
        {
            Some(job) if job.status == JobStatus::Pending => {
                job.status = JobStatus::Cancelled;
                Ok(Some(job.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_for_sender(&self, sender: &str) -> Result<Vec<ScheduledJob>, JobError> {
        let jobs = self.jobs.lock().await;
        let mut mine: Vec<_> = jobs
            .iter()
            .filter(|j| j.from_email == sender && j.status != JobStatus::Cancelled)
            .cloned()
            .collect();
        mine.sort_by_key(|j| j.scheduled_for);
        Ok(mine)
    }
}
