//! The bulk send engine: render + send + record, one recipient at a time.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::contacts::NormalizedBatch;
use crate::jobs::{RecipientOutcome, SendOutcome};
use crate::mail::{Attachment, Email, MailError, TransportProvider};
use crate::render::{render, MessageTemplate};

/// Result entry email used for rows that carried no address.
const NO_EMAIL: &str = "N/A";

/// Job-level failures that abort a bulk send before or between recipients.
///
/// Per-recipient send failures are never surfaced here; they are recorded in
/// the returned outcome list.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to obtain transport: {0}")]
    Transport(#[from] MailError),
}

/// Sends one personalized email per recipient and records an outcome for
/// every row, including skips.
///
/// Recipients within one call are processed strictly sequentially: the
/// transport is per-sender and provider quotas make parallel sends within a
/// job counterproductive. Across calls, the SMTP provider single-flights
/// sends per sender identity, so concurrent jobs for one sender never have
/// two sends in flight at the same time.
#[derive(Clone)]
pub struct BulkSendEngine<P: TransportProvider> {
    transports: P,
    send_timeout: Duration,
}

impl<P: TransportProvider> BulkSendEngine<P> {
    pub fn new(transports: P, send_timeout: Duration) -> Self {
        Self {
            transports,
            send_timeout,
        }
    }

    /// Attempt delivery to every recipient in `batch`.
    ///
    /// Returns one [`RecipientOutcome`] per input row: duplicates dropped by
    /// the normalizer and rows without an email are recorded as skipped,
    /// everything else as sent or failed with the transport's error text.
    ///
    /// Attachment files are deleted exactly once when the attempt finishes,
    /// on every exit path including the transport-failure one; deletion
    /// errors are logged and never escalated.
    pub async fn send_bulk(
        &self,
        sender: &str,
        batch: NormalizedBatch,
        template: &MessageTemplate,
        attachments: &[PathBuf],
    ) -> Result<Vec<RecipientOutcome>, EngineError> {
        let loaded = load_attachments(attachments).await;
        let outcome = self.send_all(sender, batch, template, &loaded).await;
        release_attachments(attachments).await;
        outcome
    }

    async fn send_all(
        &self,
        sender: &str,
        batch: NormalizedBatch,
        template: &MessageTemplate,
        attachments: &[Attachment],
    ) -> Result<Vec<RecipientOutcome>, EngineError> {
        let mut report: Vec<RecipientOutcome> = batch
            .duplicates
            .iter()
            .map(|email| RecipientOutcome {
                email: email.clone(),
                outcome: SendOutcome::Skipped("duplicate".to_string()),
            })
            .collect();

        // Missing credentials abort the whole job before any send.
        let transport = self.transports.transport(sender).await?;

        for recipient in &batch.recipients {
            let Some(to) = recipient.email.clone() else {
                report.push(RecipientOutcome {
                    email: NO_EMAIL.to_string(),
                    outcome: SendOutcome::Skipped("no email found".to_string()),
                });
                continue;
            };

            let rendered = render(template, recipient);

            let mut builder = Email::builder()
                .from(sender)
                .to(&to)
                .subject(rendered.subject)
                .html(rendered.html);
            for attachment in attachments {
                builder = builder.attachment(&attachment.filename, attachment.bytes.clone());
            }

            let outcome = match builder.build() {
                Err(e) => SendOutcome::Failed(e.to_string()),
                Ok(email) => {
                    match tokio::time::timeout(self.send_timeout, transport.send(&email)).await {
                        Ok(Ok(())) => {
                            tracing::debug!(%to, "email sent");
                            SendOutcome::Sent
                        }
                        Ok(Err(e)) => {
                            tracing::warn!(%to, error = %e, "send failed");
                            SendOutcome::Failed(e.to_string())
                        }
                        Err(_) => {
                            tracing::warn!(%to, timeout = ?self.send_timeout, "send timed out");
                            SendOutcome::Failed("timeout".to_string())
                        }
                    }
                }
            };

            report.push(RecipientOutcome { email: to, outcome });
        }

        Ok(report)
    }
}

/// Read attachment files once up front. Unreadable files are skipped with a
/// warning, matching how missing attachments of an old job are handled.
async fn load_attachments(paths: &[PathBuf]) -> Vec<Attachment> {
    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        match tokio::fs::read(path).await {
            Ok(bytes) => loaded.push(Attachment {
                filename: file_name(path),
                bytes,
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable attachment");
            }
        }
    }
    loaded
}

/// Best-effort deletion of the job's attachment files.
async fn release_attachments(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to delete attachment");
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
