use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::events::NotificationEvent;
use crate::domain::inbound::normalize_phone;
use crate::domain::message::{EnqueueOutcome, Message, NewMessage};
use crate::domain::ports::{
    MessageRepository, TemplateRepository, WebhookRepository, WebhookTransport,
};
use crate::domain::retry::RetryPolicy;
use crate::domain::template::{render, unresolved};
use crate::domain::webhook::{build_envelope, select_webhook, SelectionCriteria, WebhookRequest};

use super::blocking;

/// Everything the notification path reads and writes.
pub trait NotificationStore:
    MessageRepository + WebhookRepository + TemplateRepository + Clone
{
}

impl<T> NotificationStore for T where
    T: MessageRepository + WebhookRepository + TemplateRepository + Clone
{
}

pub const NO_WEBHOOK_ERROR: &str = "no active webhook configured";

/// Result of one delivery attempt, already recorded on the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent {
        sent_at: DateTime<Utc>,
    },
    Failed {
        error: String,
        /// `None` once the retry budget is spent.
        next_attempt_at: Option<DateTime<Utc>>,
    },
    /// Another sender holds the row; nothing was recorded.
    LeaseLost,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The event was already notified; nothing was sent.
    Duplicate { message_id: Uuid },
    Dispatched {
        message_id: Uuid,
        delivery: DeliveryOutcome,
    },
}

pub struct NotificationService<S, T> {
    store: S,
    transport: T,
    retry: RetryPolicy,
    lease: Duration,
}

impl<S: NotificationStore, T: WebhookTransport> NotificationService<S, T> {
    pub fn new(store: S, transport: T, retry: RetryPolicy, lease: Duration) -> Self {
        Self {
            store,
            transport,
            retry,
            lease,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// End of a lease taken at `now`, at the store's microsecond precision.
    pub fn lease_until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let lease =
            chrono::Duration::from_std(self.lease).unwrap_or_else(|_| chrono::Duration::minutes(2));
        (now + lease).trunc_subsecs(6)
    }

    /// Render, enqueue and immediately attempt delivery of `event`.
    ///
    /// The row is leased while the attempt is in flight so the queue processor
    /// leaves it alone; an already-enqueued event is not sent again.
    pub async fn notify(
        &self,
        event: NotificationEvent,
        preferred_webhook: Option<String>,
    ) -> Result<NotifyOutcome, DomainError> {
        event.validate()?;
        let now = Utc::now();

        let message_id = match self.enqueue(&event, Some(self.lease_until(now))).await? {
            EnqueueOutcome::Duplicate(message_id) => {
                log::info!(
                    "Skipping {} notification, already queued as {}",
                    event.kind(),
                    message_id
                );
                return Ok(NotifyOutcome::Duplicate { message_id });
            }
            EnqueueOutcome::Inserted(id) => id,
        };

        let message = blocking(&self.store, move |s| s.find_message(message_id))
            .await?
            .ok_or(DomainError::NotFound("Message"))?;
        let delivery = self.dispatch(&message, preferred_webhook.as_deref()).await?;

        Ok(NotifyOutcome::Dispatched {
            message_id,
            delivery,
        })
    }

    /// Render the event's template and insert a pending row.
    pub async fn enqueue(
        &self,
        event: &NotificationEvent,
        lease_until: Option<DateTime<Utc>>,
    ) -> Result<EnqueueOutcome, DomainError> {
        let stored = match event.template_name() {
            Some(name) => blocking(&self.store, move |s| s.active_template(&name)).await?,
            None => None,
        };
        let template = stored.unwrap_or_else(|| event.fallback_template());

        let vars = event.variables();
        let missing = unresolved(&template, &vars);
        if !missing.is_empty() {
            log::warn!(
                "{} template leaves placeholders unresolved: {}",
                event.kind(),
                missing.join(", ")
            );
        }

        let content = render(&template, &vars);
        if content.trim().is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "{} notification has no content",
                event.kind()
            )));
        }

        let message = NewMessage {
            dedupe_key: Some(event.dedupe_key().into_string()),
            customer_id: event.customer_id(),
            notification_type: Some(event.kind().to_string()),
            webhook_type: event.webhook_type(),
            order_status: event.order_status().map(str::to_string),
            next_attempt_at: lease_until,
            ..NewMessage::outbound(normalize_phone(event.phone()), content)
        };

        blocking(&self.store, move |s| s.enqueue(message)).await
    }

    /// Post `message` to the selected webhook and record the result on its row.
    ///
    /// `message.next_attempt_at` must be the lease the caller holds. It is
    /// renewed before the post, and the result is only recorded while the
    /// renewed lease is still current.
    pub async fn dispatch(
        &self,
        message: &Message,
        preferred_webhook: Option<&str>,
    ) -> Result<DeliveryOutcome, DomainError> {
        let id = message.id;
        let held = message
            .next_attempt_at
            .ok_or_else(|| DomainError::Internal(format!("message {id} is not leased")))?;
        let lease = self.lease_until(Utc::now());
        if !blocking(&self.store, move |s| s.renew_lease(id, held, lease)).await? {
            log::warn!("Message {} is held by another sender, skipping", id);
            return Ok(DeliveryOutcome::LeaseLost);
        }

        let settings = blocking(&self.store, |s| s.active_webhooks()).await?;
        let criteria = SelectionCriteria {
            webhook_type: message.webhook_type,
            preferred_name: preferred_webhook,
            order_status: message.order_status.as_deref(),
        };

        let error = match select_webhook(&settings, &criteria) {
            None => NO_WEBHOOK_ERROR.to_string(),
            Some(setting) => {
                log::debug!(
                    "Posting message {} to webhook '{}'",
                    id,
                    setting.webhook_name
                );
                let request = WebhookRequest {
                    url: setting.webhook_url.clone(),
                    secret_key: setting.secret_key.clone(),
                    body: build_envelope(message, Utc::now().timestamp()),
                };
                match self.transport.post(request).await {
                    Ok(response) if response.is_success() => {
                        let sent_at = Utc::now();
                        if !blocking(&self.store, move |s| s.record_sent(id, lease, sent_at))
                            .await?
                        {
                            log::warn!("Message {} was taken over while sending", id);
                            return Ok(DeliveryOutcome::LeaseLost);
                        }
                        log::info!("Message {} sent via '{}'", id, setting.webhook_name);
                        return Ok(DeliveryOutcome::Sent { sent_at });
                    }
                    Ok(response) => response.failure_text(),
                    Err(e) => e.to_string(),
                }
            }
        };

        let failed_at = Utc::now();
        let attempts_made = message.attempt_count + 1;
        let next_attempt_at = self.retry.next_attempt_at(attempts_made, failed_at);
        let recorded = error.clone();
        if !blocking(&self.store, move |s| {
            s.record_failure(id, lease, &recorded, next_attempt_at)
        })
        .await?
        {
            log::warn!("Message {} was taken over while sending", id);
            return Ok(DeliveryOutcome::LeaseLost);
        }

        match next_attempt_at {
            Some(at) => log::warn!(
                "Message {} failed (attempt {}), retrying at {}: {}",
                id,
                attempts_made,
                at,
                error
            ),
            None => log::error!(
                "Message {} dead-lettered after {} attempts: {}",
                id,
                attempts_made,
                error
            ),
        }

        Ok(DeliveryOutcome::Failed {
            error,
            next_attempt_at,
        })
    }
}
