use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::job::{RecipientOutcome, ScheduledJob};
use super::JobError;

/// Final state written back when a job finishes processing.
#[derive(Debug, Clone)]
pub enum JobCompletion {
    /// All recipients were attempted; the per-recipient outcomes (including
    /// skips and failures) are recorded.
    Sent {
        result: Vec<RecipientOutcome>,
        sent_at: OffsetDateTime,
    },
    /// A job-level error aborted processing before/while sending. The result
    /// list stays empty.
    Failed { error: String },
}

/// Backend-agnostic persistence for scheduled jobs.
///
/// Implement this trait to plug in any document store. A durable backend
/// needs an index on (status, scheduled_for) for `find_due`, and `claim`
/// must be a conditional update that only succeeds when the prior status is
/// exactly `pending` — for MongoDB that is a `findOneAndUpdate` on
/// `{_id, status: "pending"}`, for SQL an `UPDATE ... WHERE status =
/// 'pending'` returning the row.
#[async_trait]
pub trait JobStore: Send + Sync + Clone + 'static {
    /// Persist a new job.
    async fn create(&self, job: &ScheduledJob) -> Result<(), JobError>;

    /// Fetch a job by id.
    async fn get(&self, id: Uuid) -> Result<Option<ScheduledJob>, JobError>;

    /// All pending jobs with `scheduled_for <= now`, ordered by
    /// `scheduled_for` ascending.
    async fn find_due(&self, now: OffsetDateTime) -> Result<Vec<ScheduledJob>, JobError>;

    /// Atomically transition the job from `pending` to `processing`.
    ///
    /// Returns `None` when the job does not exist or has already left
    /// `pending` — callers treat that as "someone else claimed it" and skip,
    /// not as an error. Exactly one claim ever succeeds per job.
    async fn claim(&self, id: Uuid) -> Result<Option<ScheduledJob>, JobError>;

    /// Write the final state of a processed job.
    async fn write_result(&self, id: Uuid, completion: JobCompletion) -> Result<(), JobError>;

    /// Transition a still-pending job owned by `sender` to `cancelled`.
    ///
    /// Returns `None` when the job does not exist, belongs to another
    /// sender, or has already left `pending`.
    async fn cancel(&self, id: Uuid, sender: &str) -> Result<Option<ScheduledJob>, JobError>;

    /// Every non-cancelled job for `sender`, ordered by `scheduled_for`
    /// ascending.
    async fn list_for_sender(&self, sender: &str) -> Result<Vec<ScheduledJob>, JobError>;
}
