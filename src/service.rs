//! Boundary operations exposed to the rest of the system.
//!
//! The HTTP layer (out of scope here) maps requests onto [`MailService`]:
//! schedule, list, cancel, immediate send, and the manual poll trigger.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::contacts::{NormalizedBatch, RawRow};
use crate::engine::{BulkSendEngine, EngineError};
use crate::jobs::{Clock, JobError, JobStore, RecipientOutcome, ScheduledJob, SystemClock};
use crate::mail::TransportProvider;
use crate::render::MessageTemplate;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("scheduled date must be in the future")]
    ScheduledInPast,

    #[error("job not found or cannot be cancelled: {0}")]
    CannotCancel(Uuid),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Payload for scheduling a bulk email.
///
/// Attachments must already be persisted to stable storage; the job takes
/// ownership of the files and deletes them after processing.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRequest {
    pub from_email: String,
    pub template: MessageTemplate,
    pub recipients: Vec<RawRow>,
    #[serde(default)]
    pub attachments: Vec<PathBuf>,
    pub scheduled_for: OffsetDateTime,
}

/// Facade over the job store and send engine.
#[derive(Clone)]
pub struct MailService<S: JobStore, P: TransportProvider> {
    store: S,
    engine: BulkSendEngine<P>,
    clock: Arc<dyn Clock>,
}

impl<S: JobStore, P: TransportProvider> MailService<S, P> {
    pub fn new(store: S, engine: BulkSendEngine<P>) -> Self {
        Self {
            store,
            engine,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the wall clock, for tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate and persist a scheduled job; returns its id.
    ///
    /// Validation failures are synchronous and nothing is persisted:
    /// `scheduled_for` must be strictly in the future, and the sender and
    /// recipient list must be non-empty.
    pub async fn schedule_email(&self, request: ScheduleRequest) -> Result<Uuid, ServiceError> {
        if request.from_email.is_empty() {
            return Err(ServiceError::MissingField("from_email"));
        }
        if request.recipients.is_empty() {
            return Err(ServiceError::MissingField("recipients"));
        }
        if request.scheduled_for <= self.clock.now() {
            return Err(ServiceError::ScheduledInPast);
        }

        let job = ScheduledJob::new(
            request.from_email,
            request.template,
            request.recipients,
            request.attachments,
            request.scheduled_for,
            self.clock.now(),
        );
        let id = job.id;
        self.store.create(&job).await?;

        tracing::info!(job_id = %id, scheduled_for = %job.scheduled_for, "email scheduled");
        Ok(id)
    }

    /// Every non-cancelled job for `sender`, soonest first.
    pub async fn scheduled_emails(&self, sender: &str) -> Result<Vec<ScheduledJob>, ServiceError> {
        Ok(self.store.list_for_sender(sender).await?)
    }

    /// Cancel a still-pending job owned by `sender`.
    ///
    /// Jobs that were already claimed run to completion; only `pending` jobs
    /// can be cancelled.
    pub async fn cancel_scheduled_email(
        &self,
        id: Uuid,
        sender: &str,
    ) -> Result<ScheduledJob, ServiceError> {
        self.store
            .cancel(id, sender)
            .await?
            .ok_or(ServiceError::CannotCancel(id))
    }

    /// Send a bulk email immediately, bypassing the queue.
    ///
    /// Uses the same normalize + send path as scheduled processing, so
    /// deduplication and outcome reporting behave identically.
    pub async fn send_now(
        &self,
        sender: &str,
        recipients: &[RawRow],
        template: &MessageTemplate,
        attachments: &[PathBuf],
    ) -> Result<Vec<RecipientOutcome>, ServiceError> {
        if sender.is_empty() {
            return Err(ServiceError::MissingField("from_email"));
        }
        if recipients.is_empty() {
            return Err(ServiceError::MissingField("recipients"));
        }

        let batch = NormalizedBatch::from_rows(recipients);
        Ok(self
            .engine
            .send_bulk(sender, batch, template, attachments)
            .await?)
    }
}
