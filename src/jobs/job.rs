use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::contacts::RawRow;
use crate::render::MessageTemplate;

/// Lifecycle status of a scheduled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Sent,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Sent => write!(f, "sent"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

// String conversion for durable backends that store the status as text.
impl TryFrom<String> for JobStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// Delivery outcome for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SendOutcome {
    Sent,
    Failed(String),
    Skipped(String),
}

impl std::fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// One entry in a job's result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientOutcome {
    /// Recipient address, or `"N/A"` for rows with no email field.
    pub email: String,
    pub outcome: SendOutcome,
}

/// A persisted request to send a personalized bulk email at/after a future
/// time.
///
/// The recipient rows are captured at creation and never re-fetched; edits go
/// through cancel + recreate. `result` stays empty until the job leaves
/// `processing`. Attachment files are owned by the job and deleted once the
/// bulk send attempt finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: Uuid,
    /// Sender identity the job sends as (and is owned by).
    pub from_email: String,
    pub template: MessageTemplate,
    /// Raw contact rows as captured at creation time.
    pub recipients: Vec<RawRow>,
    /// Attachment file paths, already persisted to stable storage.
    pub attachments: Vec<PathBuf>,
    pub scheduled_for: OffsetDateTime,
    pub status: JobStatus,
    /// Per-recipient outcomes, populated when processing completes.
    pub result: Vec<RecipientOutcome>,
    pub created_at: OffsetDateTime,
    pub sent_at: Option<OffsetDateTime>,
    pub error_message: Option<String>,
}

impl ScheduledJob {
    /// Build a fresh pending job.
    pub fn new(
        from_email: impl Into<String>,
        template: MessageTemplate,
        recipients: Vec<RawRow>,
        attachments: Vec<PathBuf>,
        scheduled_for: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_email: from_email.into(),
            template,
            recipients,
            attachments,
            scheduled_for,
            status: JobStatus::Pending,
            result: Vec::new(),
            created_at: now,
            sent_at: None,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Sent,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::try_from(status.to_string()), Ok(status));
        }
        assert!(JobStatus::try_from("bogus".to_string()).is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Sent.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }
}
