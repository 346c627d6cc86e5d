//! The mail transport adapter.
//!
//! Wraps SMTP delivery behind the [`Mailer`] trait, keyed by sender identity:
//! every sender authenticates with their own address + app password against
//! the configured relay (Gmail by default). [`TransportProvider`] hands out a
//! transport for a sender and is where "credentials missing" surfaces;
//! [`SmtpTransportProvider`] keeps a bounded cache of built transports so a
//! long-running scheduler does not accumulate one per sender forever.
//!
//! # Environment Variables
//!
//! [`SmtpConfig::from_env`] reads:
//!
//! | Variable | Required | Description |
//! |----------|----------|-------------|
//! | `SMTP_HOST` | No | Relay hostname (default: `smtp.gmail.com`) |
//! | `SMTP_PORT` | No | Port (default: 587) |
//! | `SMTP_TLS` | No | `starttls` (default), `tls`, or `none` |
//! | `SMTP_TIMEOUT` | No | Connection timeout seconds (default: 10) |

mod mailer;
mod message;
mod transport;

pub use mailer::{Mailer, SmtpConfig, SmtpMailer};
pub use message::{Attachment, Email, EmailBuilder};
pub use transport::{
    CredentialStore, MemoryCredentialStore, SmtpTransportProvider, TransportProvider,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("missing required config: {0}")]
    MissingConfig(String),

    #[error("no app password configured for sender: {0}")]
    MissingCredentials(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(String),
}
