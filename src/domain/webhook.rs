//! Webhook settings, endpoint selection and the outbound delivery envelope.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;
use super::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WebhookType {
    Outgoing,
    BulkCampaign,
    Evaluation,
    Incoming,
}

impl WebhookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookType::Outgoing => "outgoing",
            WebhookType::BulkCampaign => "bulk_campaign",
            WebhookType::Evaluation => "evaluation",
            WebhookType::Incoming => "incoming",
        }
    }
}

impl fmt::Display for WebhookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outgoing" => Ok(WebhookType::Outgoing),
            "bulk_campaign" => Ok(WebhookType::BulkCampaign),
            "evaluation" => Ok(WebhookType::Evaluation),
            "incoming" => Ok(WebhookType::Incoming),
            other => Err(DomainError::InvalidInput(format!(
                "unknown webhook type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebhookSetting {
    pub id: Uuid,
    pub webhook_name: String,
    pub webhook_type: WebhookType,
    pub webhook_url: String,
    pub is_active: bool,
    /// Order statuses this endpoint accepts. `None` or empty accepts all.
    pub order_statuses: Option<Vec<String>>,
    pub secret_key: Option<String>,
}

impl WebhookSetting {
    fn accepts_status(&self, status: &str) -> bool {
        match &self.order_statuses {
            Some(statuses) if !statuses.is_empty() => statuses.iter().any(|s| s == status),
            _ => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectionCriteria<'a> {
    pub webhook_type: WebhookType,
    pub preferred_name: Option<&'a str>,
    pub order_status: Option<&'a str>,
}

impl<'a> SelectionCriteria<'a> {
    pub fn for_type(webhook_type: WebhookType) -> Self {
        Self {
            webhook_type,
            preferred_name: None,
            order_status: None,
        }
    }
}

/// Pick the endpoint for one delivery.
///
/// Filters active settings by type, then narrows to `preferred_name` when some
/// candidate carries it, then drops candidates whose `order_statuses` exclude
/// the order status. The first survivor wins; otherwise the first active
/// setting of any type is used.
pub fn select_webhook<'s>(
    settings: &'s [WebhookSetting],
    criteria: &SelectionCriteria<'_>,
) -> Option<&'s WebhookSetting> {
    let mut candidates: Vec<&WebhookSetting> = settings
        .iter()
        .filter(|s| s.is_active && s.webhook_type == criteria.webhook_type)
        .collect();

    if let Some(name) = criteria.preferred_name {
        if candidates.iter().any(|s| s.webhook_name == name) {
            candidates.retain(|s| s.webhook_name == name);
        }
    }

    if let Some(status) = criteria.order_status {
        candidates.retain(|s| s.accepts_status(status));
    }

    candidates
        .first()
        .copied()
        .or_else(|| settings.iter().find(|s| s.is_active))
}

/// JSON body posted to the workflow engine.
///
/// Content and recipient are repeated under every alias downstream flows are
/// known to read.
pub fn build_envelope(message: &Message, timestamp: i64) -> Value {
    json!({
        "message": message.content,
        "messageText": message.content,
        "text": message.content,
        "phone": message.to_number,
        "to": message.to_number,
        "phoneNumber": message.to_number,
        "notification_type": message.notification_type,
        "timestamp": timestamp,
        "message_id": message.id,
        "customer_id": message.customer_id,
        "dedupe_key": message.dedupe_key,
    })
}

#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub url: String,
    pub secret_key: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Text recorded on the message row when the call was rejected.
    pub fn failure_text(&self) -> String {
        let body = self.body.trim();
        if body.is_empty() {
            format!("HTTP {}", self.status)
        } else {
            format!("HTTP {}: {}", self.status, body)
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("webhook request timed out: {0}")]
    Timeout(String),
    #[error("webhook request failed: {0}")]
    Request(String),
}
