use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::errors::DomainError;
use crate::domain::ports::WebhookTransport;

use super::blocking;
use super::notification_service::{DeliveryOutcome, NotificationService, NotificationStore};

#[derive(Debug, Clone, Copy)]
pub struct ProcessorConfig {
    pub batch_size: i64,
    /// Upper bound on batches per drain.
    pub max_batches: u32,
    /// Pause between consecutive batches of one drain.
    pub pause: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_batches: 20,
            pause: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BatchReport {
    pub claimed: usize,
    pub sent: usize,
    pub failed: usize,
    /// Failures that exhausted the retry budget.
    pub dead_lettered: usize,
    /// Rows another sender took over before this batch reached them.
    pub skipped: usize,
    /// Rows that could not be processed because the store errored.
    pub errors: usize,
    /// Rows still due after the batch.
    pub remaining: i64,
}

impl BatchReport {
    fn absorb(&mut self, other: &BatchReport) {
        self.claimed += other.claimed;
        self.sent += other.sent;
        self.failed += other.failed;
        self.dead_lettered += other.dead_lettered;
        self.skipped += other.skipped;
        self.errors += other.errors;
        self.remaining = other.remaining;
    }
}

/// Retries queued messages whose lease or backoff has expired.
pub struct QueueProcessor<S, T> {
    notifier: Arc<NotificationService<S, T>>,
    config: ProcessorConfig,
}

impl<S: NotificationStore, T: WebhookTransport> QueueProcessor<S, T> {
    pub fn new(notifier: Arc<NotificationService<S, T>>, config: ProcessorConfig) -> Self {
        Self { notifier, config }
    }

    /// Claim one batch of due rows and attempt each once.
    ///
    /// `now` decides which rows are due. Each row's lease is renewed just
    /// before its own send, so rows late in a slow batch stay protected.
    pub async fn process_batch(&self, now: DateTime<Utc>) -> Result<BatchReport, DomainError> {
        let limit = self.config.batch_size;
        let lease_until = self.notifier.lease_until(now);
        let batch = blocking(self.notifier.store(), move |s| {
            s.claim_due(limit, now, lease_until)
        })
        .await?;

        let mut report = BatchReport {
            claimed: batch.len(),
            ..BatchReport::default()
        };

        for message in &batch {
            match self.notifier.dispatch(message, None).await {
                Ok(DeliveryOutcome::Sent { .. }) => report.sent += 1,
                Ok(DeliveryOutcome::LeaseLost) => report.skipped += 1,
                Ok(DeliveryOutcome::Failed {
                    next_attempt_at, ..
                }) => {
                    report.failed += 1;
                    if next_attempt_at.is_none() {
                        report.dead_lettered += 1;
                    }
                }
                Err(e) => {
                    log::error!("Could not process message {}: {}", message.id, e);
                    report.errors += 1;
                }
            }
        }

        report.remaining = blocking(self.notifier.store(), move |s| s.count_due(now)).await?;
        Ok(report)
    }

    /// Process batches until nothing is due or `max_batches` is reached.
    pub async fn drain(&self) -> Result<BatchReport, DomainError> {
        let mut total = BatchReport::default();

        for batch_no in 0..self.config.max_batches {
            if batch_no > 0 {
                tokio::time::sleep(self.config.pause).await;
            }
            let report = self.process_batch(Utc::now()).await?;
            total.absorb(&report);
            if report.claimed == 0 || report.remaining == 0 {
                break;
            }
        }

        if total.claimed > 0 {
            log::info!(
                "Queue drain: {} claimed, {} sent, {} failed ({} dead-lettered), {} still due",
                total.claimed,
                total.sent,
                total.failed,
                total.dead_lettered,
                total.remaining
            );
        }
        Ok(total)
    }

    /// Drain once per `every` for the life of the process.
    pub async fn run(self: Arc<Self>, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = self.drain().await {
                log::error!("Queue processor run failed: {}", e);
            }
        }
    }
}
