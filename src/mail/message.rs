//! Email message type and builder.

use serde::{Deserialize, Serialize};

use super::MailError;

/// A file attached to an outgoing message. Bytes are read once per job and
/// shared across every recipient's message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A complete email message ready to send to one recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body content.
    pub html: String,
    /// Attached files, in order.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// Create a new email builder.
    pub fn builder() -> EmailBuilder {
        EmailBuilder::default()
    }
}

/// Builder for constructing [`Email`] instances.
#[derive(Debug, Default)]
pub struct EmailBuilder {
    from: Option<String>,
    to: Option<String>,
    subject: Option<String>,
    html: Option<String>,
    attachments: Vec<Attachment>,
}

impl EmailBuilder {
    /// Set the sender address (required).
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Set the recipient address (required).
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to = Some(address.into());
        self
    }

    /// Set the subject line (required).
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the HTML body (required).
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Attach a file.
    pub fn attachment(mut self, filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.attachments.push(Attachment {
            filename: filename.into(),
            bytes,
        });
        self
    }

    /// Build the email, validating required fields.
    pub fn build(self) -> Result<Email, MailError> {
        let from = self
            .from
            .ok_or_else(|| MailError::Build("from address required".into()))?;

        let to = self
            .to
            .ok_or_else(|| MailError::Build("recipient required".into()))?;

        let subject = self
            .subject
            .ok_or_else(|| MailError::Build("subject required".into()))?;

        let html = self
            .html
            .ok_or_else(|| MailError::Build("html body required".into()))?;

        Ok(Email {
            from,
            to,
            subject,
            html,
            attachments: self.attachments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_html_email() {
        let email = Email::builder()
            .from("sender@example.com")
            .to("user@example.com")
            .subject("Hello")
            .html("<p>Body</p>")
            .build()
            .unwrap();

        assert_eq!(email.from, "sender@example.com");
        assert_eq!(email.to, "user@example.com");
        assert_eq!(email.subject, "Hello");
        assert_eq!(email.html, "<p>Body</p>");
        assert!(email.attachments.is_empty());
    }

    #[test]
    fn build_with_attachment() {
        let email = Email::builder()
            .from("sender@example.com")
            .to("user@example.com")
            .subject("Resume")
            .html("<p>Attached</p>")
            .attachment("resume.pdf", vec![1, 2, 3])
            .build()
            .unwrap();

        assert_eq!(email.attachments.len(), 1);
        assert_eq!(email.attachments[0].filename, "resume.pdf");
    }

    #[test]
    fn build_requires_from() {
        let result = Email::builder().to("a@b.com").subject("Hi").html("x").build();
        assert!(result.is_err());
    }

    #[test]
    fn build_requires_recipient() {
        let result = Email::builder().from("a@b.com").subject("Hi").html("x").build();
        assert!(result.is_err());
    }

    #[test]
    fn build_requires_subject() {
        let result = Email::builder().from("a@b.com").to("a@b.com").html("x").build();
        assert!(result.is_err());
    }

    #[test]
    fn build_requires_body() {
        let result = Email::builder().from("a@b.com").to("a@b.com").subject("Hi").build();
        assert!(result.is_err());
    }
}
