//! Environment-based configuration.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::mail::SmtpConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment config: {0}")]
    Env(String),
}

#[derive(Debug, Clone, Deserialize)]
struct SchedulerEnv {
    /// Seconds between poll cycles.
    #[serde(rename = "poll_interval_secs", default = "default_poll_interval")]
    poll_interval_secs: u64,

    /// Per-send timeout in seconds.
    #[serde(rename = "send_timeout_secs", default = "default_send_timeout")]
    send_timeout_secs: u64,

    /// Maximum number of cached per-sender SMTP transports.
    #[serde(rename = "transport_cache_size", default = "default_cache_size")]
    transport_cache_size: usize,
}

fn default_poll_interval() -> u64 {
    60
}

fn default_send_timeout() -> u64 {
    30
}

fn default_cache_size() -> usize {
    32
}

/// Full runtime configuration.
///
/// # Environment Variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `SMTP_HOST` | `smtp.gmail.com` | SMTP relay hostname |
/// | `SMTP_PORT` | `587` | Relay port |
/// | `SMTP_TLS` | `starttls` | `starttls`, `tls`, or `none` |
/// | `SMTP_TIMEOUT` | `10` | Connection timeout seconds |
/// | `POLL_INTERVAL_SECS` | `60` | Seconds between poll cycles |
/// | `SEND_TIMEOUT_SECS` | `30` | Per-send timeout seconds |
/// | `TRANSPORT_CACHE_SIZE` | `32` | Cached per-sender transports |
#[derive(Debug, Clone)]
pub struct SmartSenderConfig {
    pub smtp: SmtpConfig,
    pub poll_interval: Duration,
    pub send_timeout: Duration,
    pub transport_cache_size: usize,
}

impl SmartSenderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let smtp = SmtpConfig::from_env().map_err(|e| ConfigError::Env(e.to_string()))?;
        let scheduler: SchedulerEnv =
            serde_env::from_env().map_err(|e| ConfigError::Env(e.to_string()))?;

        Ok(Self {
            smtp,
            poll_interval: Duration::from_secs(scheduler.poll_interval_secs),
            send_timeout: Duration::from_secs(scheduler.send_timeout_secs),
            transport_cache_size: scheduler.transport_cache_size,
        })
    }
}

impl Default for SmartSenderConfig {
    fn default() -> Self {
        Self {
            smtp: SmtpConfig::default(),
            poll_interval: Duration::from_secs(default_poll_interval()),
            send_timeout: Duration::from_secs(default_send_timeout()),
            transport_cache_size: default_cache_size(),
        }
    }
}
