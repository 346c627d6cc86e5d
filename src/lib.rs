//! Scheduled bulk-email dispatch.
//!
//! SmartSender takes a list of contact rows, a message template, and a
//! delivery time, and sends one personalized email per recipient through a
//! per-sender SMTP channel, recording an outcome for every recipient.
//!
//! # Architecture
//!
//! - [`contacts`] — Normalizes raw spreadsheet rows and deduplicates them by
//!   email. The single home of duplicate detection.
//! - [`render`] — Pure template → subject/HTML-body rendering with
//!   per-recipient personalization.
//! - [`mail`] — The transport adapter: [`Mailer`](mail::Mailer) trait, SMTP
//!   implementation, and a bounded per-sender transport cache.
//! - [`engine`] — The bulk send loop: render + send + record per recipient,
//!   sequential within a job, attachments released once at the end.
//! - [`jobs`] — Persisted [`ScheduledJob`](jobs::ScheduledJob) lifecycle, the
//!   [`JobStore`](jobs::JobStore) trait with its atomic claim, and the
//!   polling [`Scheduler`](jobs::Scheduler).
//! - [`service`] — The boundary facade the HTTP layer calls: schedule, list,
//!   cancel, send-now, trigger a poll cycle.
//!
//! # Quick Start
//!
//! ```ignore
//! let store = MemoryJobStore::new();
//! let transports = SmtpTransportProvider::new(smtp_config, credentials, 32);
//! let engine = BulkSendEngine::new(transports, Duration::from_secs(30));
//!
//! let service = MailService::new(store.clone(), engine.clone());
//! let job_id = service.schedule_email(request).await?;
//!
//! let handle = Scheduler::new(store, engine)
//!     .poll_interval(Duration::from_secs(60))
//!     .start();
//! // ... on shutdown:
//! handle.stop().await;
//! ```

pub mod config;
pub mod contacts;
pub mod engine;
pub mod jobs;
pub mod mail;
pub mod render;
pub mod service;

pub use config::SmartSenderConfig;
pub use contacts::{dedupe, normalize, NormalizedBatch, RawRow, RecipientRecord};
pub use engine::{BulkSendEngine, EngineError};
pub use jobs::{
    JobCompletion, JobError, JobStatus, JobStore, MemoryJobStore, RecipientOutcome,
    ScheduledJob, Scheduler, SchedulerHandle, SendOutcome,
};
pub use mail::{
    CredentialStore, Email, MailError, Mailer, MemoryCredentialStore, SmtpConfig, SmtpMailer,
    SmtpTransportProvider, TransportProvider,
};
pub use render::{MessageTemplate, RenderedMessage};
pub use service::{MailService, ScheduleRequest, ServiceError};
