//! Scheduled job lifecycle: persistence and the polling scheduler.
//!
//! # Architecture
//!
//! - [`ScheduledJob`] — A persisted request to send a personalized bulk email
//!   at/after a future time, with per-recipient outcomes written back.
//! - [`JobStore`] — Backend-agnostic persistence trait. The atomic
//!   [`claim`](JobStore::claim) (conditional pending → processing) is the
//!   concurrency boundary that prevents double-sends under concurrent
//!   pollers.
//! - [`MemoryJobStore`] — In-memory store for development and testing.
//! - [`Scheduler`] — Owns a non-overlapping poll loop: find due jobs, claim
//!   each, normalize recipients, run the bulk send, write the result.
//!
//! # State machine
//!
//! ```text
//! pending --(claim, due)--> processing --(success)--> sent
//!                           processing --(failure)--> failed
//! pending --(cancel)------> cancelled
//! ```
//!
//! `sent`, `failed`, and `cancelled` are terminal; no job is reprocessed
//! after entering them.

mod job;
mod memory;
mod scheduler;
mod store;

pub use job::{JobStatus, RecipientOutcome, ScheduledJob, SendOutcome};
pub use memory::MemoryJobStore;
pub use scheduler::{Clock, Scheduler, SchedulerHandle, SystemClock};
pub use store::{JobCompletion, JobStore};

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("job not found: {0}")]
    NotFound(Uuid),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("store error: {0}")]
    Store(String),
}
