//! Shared test doubles: scriptable mailer, transport provider, manual clock.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use smartsender::jobs::Clock;
use smartsender::mail::{Email, MailError, Mailer, TransportProvider};
use smartsender::render::MessageTemplate;
use smartsender::{BulkSendEngine, RawRow};

/// Records every sent email; fails or stalls for scripted recipient
/// addresses.
#[derive(Default)]
pub struct MockMailer {
    pub sent: Mutex<Vec<Email>>,
    pub fail_for: HashSet<String>,
    pub delay_for: HashMap<String, Duration>,
}

impl MockMailer {
    pub fn sent_to(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|e| e.to.clone()).collect()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        if let Some(delay) = self.delay_for.get(&email.to) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_for.contains(&email.to) {
            return Err(MailError::Smtp("mailbox unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Hands out the mock mailer, or fails like a sender with no credentials.
#[derive(Clone)]
pub struct MockTransportProvider {
    pub mailer: Arc<MockMailer>,
    pub fail_transport: bool,
}

impl MockTransportProvider {
    pub fn new(mailer: Arc<MockMailer>) -> Self {
        Self {
            mailer,
            fail_transport: false,
        }
    }

    pub fn failing(mailer: Arc<MockMailer>) -> Self {
        Self {
            mailer,
            fail_transport: true,
        }
    }
}

#[async_trait]
impl TransportProvider for MockTransportProvider {
    async fn transport(&self, sender: &str) -> Result<Arc<dyn Mailer>, MailError> {
        if self.fail_transport {
            return Err(MailError::MissingCredentials(sender.to_string()));
        }
        Ok(self.mailer.clone())
    }
}

/// Settable time source.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);

impl ManualClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.0.lock().unwrap()
    }
}

pub fn engine(provider: MockTransportProvider) -> BulkSendEngine<MockTransportProvider> {
    BulkSendEngine::new(provider, Duration::from_secs(5))
}

pub fn template() -> MessageTemplate {
    MessageTemplate {
        subject: "Hello from {{company}}".to_string(),
        body: "Hi {{name}},\nJust reaching out.".to_string(),
        sender_name: "Jane Doe".to_string(),
        sender_contact: "+1 555 0100".to_string(),
        sender_link: None,
        sender_company: None,
    }
}

pub fn contact_row(email: Option<&str>, name: &str) -> RawRow {
    let mut row = RawRow::new();
    if let Some(email) = email {
        row.insert("Email".to_string(), serde_json::Value::String(email.to_string()));
    }
    row.insert("Name".to_string(), serde_json::Value::String(name.to_string()));
    row
}
