//! Per-recipient message rendering.
//!
//! Rendering is pure and deterministic: identical template + recipient inputs
//! always produce byte-identical output, which is what makes retried sends
//! idempotent. No network, no clock, no randomness.
//!
//! Recipient-supplied fields are inserted into the HTML verbatim, without
//! escaping. Callers own the trust decision for spreadsheet content.

use serde::{Deserialize, Serialize};

use crate::contacts::RecipientRecord;

/// Honorific used when a recipient row has no name.
const DEFAULT_NAME: &str = "Sir/Ma'am";
/// Stand-in used when a recipient row has no company.
const DEFAULT_COMPANY: &str = "your organisation";

/// The sender-authored template a job carries.
///
/// `subject` and `body` may contain `{{name}}` and `{{company}}` placeholders,
/// substituted per recipient. `body` is free text; newlines become `<br>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub subject: String,
    pub body: String,
    /// Sender display name for the signature block.
    pub sender_name: String,
    /// Sender contact info (phone number in the signature).
    pub sender_contact: String,
    /// Optional LinkedIn profile URL, linked in the signature when present.
    #[serde(default)]
    pub sender_link: Option<String>,
    /// Optional sender company, shown under the sender's name in the
    /// signature when present.
    #[serde(default)]
    pub sender_company: Option<String>,
}

/// A fully rendered message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub html: String,
}

/// Render `template` for one recipient.
pub fn render(template: &MessageTemplate, recipient: &RecipientRecord) -> RenderedMessage {
    let name = recipient.name.as_deref().unwrap_or(DEFAULT_NAME);
    let company = recipient.company.as_deref().unwrap_or(DEFAULT_COMPANY);

    let subject = fill_placeholders(&template.subject, name, company);
    let body_text = fill_placeholders(&template.body, name, company).replace('\n', "<br>");

    let signature_link = match &template.sender_link {
        Some(link) => format!(
            "Connect with me on <a href=\"{link}\" target=\"_blank\">LinkedIn</a>."
        ),
        None => String::new(),
    };

    let signature_company = match &template.sender_company {
        Some(sender_company) => format!("<br>{sender_company}"),
        None => String::new(),
    };

    let html = format!(
        "<p>Dear {name},</p>\n\
         <p>{body_text}</p>\n\
         <p>Best Regards,<br>{sender}{signature_company}\n\
         <br>Contact No.{contact}<br>\n\
         {signature_link}\n\
         </p>",
        sender = template.sender_name,
        contact = template.sender_contact,
    );

    RenderedMessage { subject, html }
}

fn fill_placeholders(text: &str, name: &str, company: &str) -> String {
    text.replace("{{name}}", name).replace("{{company}}", company)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> MessageTemplate {
        MessageTemplate {
            subject: "Opportunities at {{company}}".into(),
            body: "Hi {{name}},\nI would love to connect.".into(),
            sender_name: "Jane Doe".into(),
            sender_contact: "+1 555 0100".into(),
            sender_link: Some("https://linkedin.com/in/janedoe".into()),
            sender_company: None,
        }
    }

    fn recipient(name: Option<&str>, company: Option<&str>) -> RecipientRecord {
        RecipientRecord {
            email: Some("a@b.com".into()),
            name: name.map(Into::into),
            company: company.map(Into::into),
            extra: Default::default(),
        }
    }

    #[test]
    fn substitutes_placeholders_in_subject_and_body() {
        let rendered = render(&template(), &recipient(Some("Alice"), Some("Acme")));
        assert_eq!(rendered.subject, "Opportunities at Acme");
        assert!(rendered.html.contains("Hi Alice,"));
        assert!(rendered.html.contains("<p>Dear Alice,</p>"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let rendered = render(&template(), &recipient(None, None));
        assert_eq!(rendered.subject, "Opportunities at your organisation");
        assert!(rendered.html.contains("Dear Sir/Ma'am,"));
    }

    #[test]
    fn newlines_become_line_breaks() {
        let rendered = render(&template(), &recipient(Some("Alice"), Some("Acme")));
        assert!(rendered.html.contains("Hi Alice,<br>I would love to connect."));
    }

    #[test]
    fn sender_company_appears_in_the_signature() {
        let mut t = template();
        t.sender_company = Some("Initech".into());
        let rendered = render(&t, &recipient(Some("Alice"), None));
        assert!(rendered.html.contains("Best Regards,<br>Jane Doe<br>Initech"));

        let without = render(&template(), &recipient(Some("Alice"), None));
        assert!(!without.html.contains("Initech"));
        assert!(without.html.contains("Best Regards,<br>Jane Doe\n"));
    }

    #[test]
    fn link_is_omitted_when_absent() {
        let mut t = template();
        t.sender_link = None;
        let rendered = render(&t, &recipient(Some("Alice"), None));
        assert!(!rendered.html.contains("LinkedIn"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let t = template();
        let r = recipient(Some("Alice"), Some("Acme"));
        let first = render(&t, &r);
        let second = render(&t, &r);
        assert_eq!(first.subject, second.subject);
        assert_eq!(first.html, second.html);
    }

    #[test]
    fn recipient_fields_are_inserted_verbatim() {
        // No escaping of HTML-significant characters, by contract.
        let rendered = render(&template(), &recipient(Some("R&D <team>"), None));
        assert!(rendered.html.contains("Dear R&D <team>,"));
    }
}
