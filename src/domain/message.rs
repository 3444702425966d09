use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::webhook::WebhookType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
    Received,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
            MessageStatus::Received => "received",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MessageStatus::Pending),
            "sent" => Ok(MessageStatus::Sent),
            "failed" => Ok(MessageStatus::Failed),
            "received" => Ok(MessageStatus::Received),
            other => Err(DomainError::InvalidInput(format!(
                "unknown message status '{other}'"
            ))),
        }
    }
}

/// A row of the WhatsApp message queue.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub from_number: Option<String>,
    /// Unset only on received rows that did not say which number they reached.
    pub to_number: Option<String>,
    pub message_type: String,
    pub content: String,
    pub status: MessageStatus,
    pub dedupe_key: Option<String>,
    pub customer_id: Option<Uuid>,
    pub notification_type: Option<String>,
    pub webhook_type: WebhookType,
    pub order_status: Option<String>,
    pub attempt_count: i32,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub message_type: String,
    pub content: String,
    pub status: MessageStatus,
    pub dedupe_key: Option<String>,
    pub customer_id: Option<Uuid>,
    pub notification_type: Option<String>,
    pub webhook_type: WebhookType,
    pub order_status: Option<String>,
    /// A future value leases the row to the caller; `None` makes it due immediately.
    pub next_attempt_at: Option<DateTime<Utc>>,
}

impl NewMessage {
    /// An outbound text message waiting for delivery.
    pub fn outbound(to_number: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            from_number: None,
            to_number: Some(to_number.into()),
            message_type: "text".to_string(),
            content: content.into(),
            status: MessageStatus::Pending,
            dedupe_key: None,
            customer_id: None,
            notification_type: None,
            webhook_type: WebhookType::Outgoing,
            order_status: None,
            next_attempt_at: None,
        }
    }

    /// An incoming message forwarded from WhatsApp.
    pub fn received(
        from_number: impl Into<String>,
        to_number: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            from_number: Some(from_number.into()),
            to_number,
            status: MessageStatus::Received,
            notification_type: Some("inbound".to_string()),
            webhook_type: WebhookType::Incoming,
            ..Self::outbound(String::new(), content)
        }
    }
}

/// Result of inserting into the queue. A clashing dedupe key is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Inserted(Uuid),
    Duplicate(Uuid),
}

impl EnqueueOutcome {
    pub fn id(&self) -> Uuid {
        match self {
            EnqueueOutcome::Inserted(id) | EnqueueOutcome::Duplicate(id) => *id,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, EnqueueOutcome::Duplicate(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageStats {
    pub pending: i64,
    pub sent: i64,
    pub failed: i64,
    pub received: i64,
    /// Failed rows with no further attempt scheduled.
    pub dead_lettered: i64,
}
