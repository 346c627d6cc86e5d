//! Mailer trait and per-sender SMTP implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as AttachmentPart, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;

use super::{Email, MailError};

/// Async email sending trait.
///
/// Implement this trait to provide alternative backends (or test doubles).
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Send an email.
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

impl std::fmt::Debug for dyn Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Mailer")
    }
}

/// SMTP relay settings shared by every sender.
///
/// Credentials are not part of this config: each sender authenticates with
/// their own address and app password.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay hostname.
    #[serde(rename = "smtp_host", default = "default_host")]
    pub host: String,

    /// SMTP relay port (default: 587).
    #[serde(rename = "smtp_port", default = "default_port")]
    pub port: u16,

    /// TLS mode: "starttls" (default), "tls", or "none".
    #[serde(rename = "smtp_tls", default = "default_tls")]
    pub tls: String,

    /// Connection timeout in seconds (default: 10).
    #[serde(rename = "smtp_timeout", default = "default_timeout")]
    pub timeout: u64,
}

fn default_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_port() -> u16 {
    587
}

fn default_tls() -> String {
    "starttls".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tls: default_tls(),
            timeout: default_timeout(),
        }
    }
}

impl SmtpConfig {
    /// Read relay settings from environment variables.
    ///
    /// Reads `SMTP_HOST`, `SMTP_PORT`, `SMTP_TLS`, `SMTP_TIMEOUT`.
    pub fn from_env() -> Result<Self, MailError> {
        dotenvy::dotenv().ok();
        serde_env::from_env().map_err(|e| MailError::MissingConfig(e.to_string()))
    }
}

/// SMTP mailer bound to one sender identity, using lettre.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a transport authenticating as `sender` with its app password.
    pub fn for_sender(
        config: &SmtpConfig,
        sender: &str,
        app_password: &str,
    ) -> Result<Self, MailError> {
        let from: Mailbox = sender
            .parse()
            .map_err(|_| MailError::InvalidAddress(sender.to_string()))?;

        let mut builder = match config.tls.as_str() {
            "none" => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            "tls" => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Smtp(e.to_string()))?,
            _ => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Smtp(e.to_string()))?,
        };

        builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout)))
            .credentials(Credentials::new(
                sender.to_string(),
                app_password.to_string(),
            ));

        Ok(Self {
            transport: Arc::new(builder.build()),
            from,
        })
    }

    /// Build a lettre Message from our Email type.
    fn build_message(&self, email: &Email) -> Result<Message, MailError> {
        let from_mailbox = if email.from.is_empty() {
            self.from.clone()
        } else {
            email
                .from
                .parse()
                .map_err(|_| MailError::InvalidAddress(email.from.clone()))?
        };

        let to_mailbox: Mailbox = email
            .to
            .parse()
            .map_err(|_| MailError::InvalidAddress(email.to.clone()))?;

        let builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email.subject);

        let html_part = SinglePart::html(email.html.clone());

        let message = if email.attachments.is_empty() {
            builder
                .singlepart(html_part)
                .map_err(|e| MailError::Build(e.to_string()))?
        } else {
            let content_type = ContentType::parse("application/octet-stream")
                .map_err(|e| MailError::Build(e.to_string()))?;

            let mut multipart = MultiPart::mixed().singlepart(html_part);
            for attachment in &email.attachments {
                multipart = multipart.singlepart(
                    AttachmentPart::new(attachment.filename.clone())
                        .body(attachment.bytes.clone(), content_type.clone()),
                );
            }

            builder
                .multipart(multipart)
                .map_err(|e| MailError::Build(e.to_string()))?
        };

        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Smtp(e.to_string()))?;

        Ok(())
    }
}
