//! Per-sender transport lookup with a bounded cache.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Email, MailError, Mailer, SmtpConfig, SmtpMailer};

/// Looks up the app password a sender authenticates with.
///
/// The production implementation would query the user-profile store; tests
/// and small deployments use [`MemoryCredentialStore`].
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// The sender's app password, or `None` when not configured.
    async fn app_password(&self, sender: &str) -> Option<String>;
}

/// Static in-memory credential lookup.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    passwords: Arc<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new(passwords: HashMap<String, String>) -> Self {
        Self {
            passwords: Arc::new(passwords),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn app_password(&self, sender: &str) -> Option<String> {
        self.passwords.get(sender).cloned()
    }
}

/// Hands out a [`Mailer`] for a sender identity.
///
/// Obtaining a transport can fail (credentials missing or invalid); the
/// bulk send engine treats that as a job-level failure before any send.
#[async_trait]
pub trait TransportProvider: Send + Sync + Clone + 'static {
    async fn transport(&self, sender: &str) -> Result<Arc<dyn Mailer>, MailError>;
}

/// Serializes sends through one sender identity.
///
/// The lock is shared by every mailer ever handed out for the sender, so two
/// jobs sending as the same identity never have a send in flight at the same
/// time, no matter how callers interleave.
struct SenderMailer<M> {
    inner: M,
    send_lock: Arc<Mutex<()>>,
}

#[async_trait]
impl<M: Mailer> Mailer for SenderMailer<M> {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let _guard = self.send_lock.lock().await;
        self.inner.send(email).await
    }
}

/// [`TransportProvider`] that builds [`SmtpMailer`]s on demand and caches
/// them per sender.
///
/// The cache is bounded: at capacity the oldest entry is evicted before a
/// new transport is inserted, so a long-lived scheduler never holds more
/// than `capacity` SMTP sessions worth of state. Each mailer is wrapped in a
/// per-sender [`SenderMailer`] whose lock survives eviction, keeping sends
/// for one identity single-flighted even across a rebuild.
pub struct SmtpTransportProvider<C: CredentialStore> {
    config: SmtpConfig,
    credentials: Arc<C>,
    cache: Arc<Mutex<TransportCache>>,
}

// Not derived: a derive would require `C: Clone`, but the store is shared
// behind an Arc.
impl<C: CredentialStore> Clone for SmtpTransportProvider<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            credentials: self.credentials.clone(),
            cache: self.cache.clone(),
        }
    }
}

#[derive(Default)]
struct TransportCache {
    capacity: usize,
    entries: HashMap<String, Arc<SenderMailer<SmtpMailer>>>,
    insertion_order: VecDeque<String>,
    /// Per-sender send locks, held weakly: an entry lives exactly as long
    /// as some mailer for that sender does, so the map cannot grow without
    /// bound the way the cache itself would.
    send_locks: HashMap<String, Weak<Mutex<()>>>,
}

impl TransportCache {
    fn get(&self, sender: &str) -> Option<Arc<SenderMailer<SmtpMailer>>> {
        self.entries.get(sender).cloned()
    }

    /// The send lock for `sender`, shared with any mailer still alive for
    /// that identity.
    fn sender_lock(&mut self, sender: &str) -> Arc<Mutex<()>> {
        self.send_locks.retain(|_, weak| weak.strong_count() > 0);

        if let Some(lock) = self.send_locks.get(sender).and_then(Weak::upgrade) {
            return lock;
        }
        let lock = Arc::new(Mutex::new(()));
        self.send_locks
            .insert(sender.to_string(), Arc::downgrade(&lock));
        lock
    }

    fn insert(&mut self, sender: String, mailer: Arc<SenderMailer<SmtpMailer>>) {
        if self.entries.insert(sender.clone(), mailer).is_some() {
            // Replaced in place; the sender already has an eviction slot.
            return;
        }

        self.insertion_order.push_back(sender);
        while self.entries.len() > self.capacity {
            match self.insertion_order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

impl<C: CredentialStore> SmtpTransportProvider<C> {
    /// `capacity` bounds the number of cached per-sender transports and must
    /// be at least 1.
    pub fn new(config: SmtpConfig, credentials: C, capacity: usize) -> Self {
        Self {
            config,
            credentials: Arc::new(credentials),
            cache: Arc::new(Mutex::new(TransportCache {
                capacity: capacity.max(1),
                ..Default::default()
            })),
        }
    }
}

#[async_trait]
impl<C: CredentialStore> TransportProvider for SmtpTransportProvider<C> {
    async fn transport(&self, sender: &str) -> Result<Arc<dyn Mailer>, MailError> {
        {
            let cache = self.cache.lock().await;
            if let Some(mailer) = cache.get(sender) {
                return Ok(mailer);
            }
        }

        let app_password = self
            .credentials
            .app_password(sender)
            .await
            .ok_or_else(|| MailError::MissingCredentials(sender.to_string()))?;

        let inner = SmtpMailer::for_sender(&self.config, sender, &app_password)?;
        tracing::debug!(%sender, "built SMTP transport");

        let mut cache = self.cache.lock().await;
        let mailer = Arc::new(SenderMailer {
            inner,
            send_lock: cache.sender_lock(sender),
        });
        cache.insert(sender.to_string(), mailer.clone());

        Ok(mailer)
    }
}
