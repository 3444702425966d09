//! Configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::application::queue_processor::ProcessorConfig;
use crate::domain::retry::RetryPolicy;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Token expected in the `hub.verify_token` handshake.
    pub verify_token: String,
    pub webhook_timeout: Duration,
    pub queue_poll_interval: Duration,
    pub queue_batch_size: i64,
    pub queue_max_batches: u32,
    pub retry: RetryPolicy,
    /// How long an in-flight send holds its row.
    pub dispatch_lease: Duration,
    pub reminder_interval: Duration,
    /// Start the queue and reminder workers alongside the server.
    pub workers_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `DATABASE_URL` | Postgres connection URL | (required) |
    /// | `HOST` | Bind host | `0.0.0.0` |
    /// | `PORT` | Bind port | `8080` |
    /// | `WHATSAPP_VERIFY_TOKEN` | Inbound webhook handshake token | (required) |
    /// | `WEBHOOK_TIMEOUT_SECS` | Outbound webhook timeout | `30` |
    /// | `QUEUE_POLL_INTERVAL_SECS` | Queue worker period | `30` |
    /// | `QUEUE_BATCH_SIZE` | Rows claimed per batch | `50` |
    /// | `QUEUE_MAX_BATCHES` | Batches per drain | `20` |
    /// | `RETRY_MAX_ATTEMPTS` | Attempts before dead-lettering | `5` |
    /// | `RETRY_BASE_DELAY_SECS` | First retry delay | `60` |
    /// | `RETRY_MAX_DELAY_SECS` | Retry delay cap | `3600` |
    /// | `DISPATCH_LEASE_SECS` | In-flight lease length, longer than the webhook timeout | `120` |
    /// | `REMINDER_INTERVAL_SECS` | Reminder worker period | `3600` |
    /// | `WORKERS_ENABLED` | Run background workers | `true` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let verify_token = lookup("WHATSAPP_VERIFY_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing("WHATSAPP_VERIFY_TOKEN"))?;

        let secs = |key: &'static str, default: u64| -> Result<Duration, ConfigError> {
            Ok(Duration::from_secs(parse_value(key, lookup(key), default)?))
        };

        let retry = RetryPolicy {
            max_attempts: parse_value("RETRY_MAX_ATTEMPTS", lookup("RETRY_MAX_ATTEMPTS"), 5)?,
            base_delay: secs("RETRY_BASE_DELAY_SECS", 60)?,
            max_delay: secs("RETRY_MAX_DELAY_SECS", 3600)?,
        };
        if retry.max_attempts < 1 {
            return Err(ConfigError::Invalid {
                key: "RETRY_MAX_ATTEMPTS",
                value: retry.max_attempts.to_string(),
            });
        }

        let queue_batch_size: i64 =
            parse_value("QUEUE_BATCH_SIZE", lookup("QUEUE_BATCH_SIZE"), 50)?;
        if queue_batch_size < 1 {
            return Err(ConfigError::Invalid {
                key: "QUEUE_BATCH_SIZE",
                value: queue_batch_size.to_string(),
            });
        }

        let webhook_timeout = secs("WEBHOOK_TIMEOUT_SECS", 30)?;
        let dispatch_lease = secs("DISPATCH_LEASE_SECS", 120)?;
        if dispatch_lease <= webhook_timeout {
            return Err(ConfigError::Invalid {
                key: "DISPATCH_LEASE_SECS",
                value: dispatch_lease.as_secs().to_string(),
            });
        }

        Ok(Self {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_value("PORT", lookup("PORT"), 8080)?,
            verify_token,
            webhook_timeout,
            queue_poll_interval: secs("QUEUE_POLL_INTERVAL_SECS", 30)?,
            queue_batch_size,
            queue_max_batches: parse_value("QUEUE_MAX_BATCHES", lookup("QUEUE_MAX_BATCHES"), 20)?,
            retry,
            dispatch_lease,
            reminder_interval: secs("REMINDER_INTERVAL_SECS", 3600)?,
            workers_enabled: parse_value("WORKERS_ENABLED", lookup("WORKERS_ENABLED"), true)?,
        })
    }

    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            batch_size: self.queue_batch_size,
            max_batches: self.queue_max_batches,
            ..ProcessorConfig::default()
        }
    }
}

fn parse_value<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}
