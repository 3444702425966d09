//! Business events that fan out to a WhatsApp notification.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::dedupe::DedupeKey;
use super::errors::DomainError;
use super::template::TemplateVars;
use super::webhook::WebhookType;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    OrderStatusChanged {
        order_id: Uuid,
        order_number: String,
        customer_id: Option<Uuid>,
        customer_name: String,
        phone: String,
        status: String,
        /// Time of the status mutation; identifies the transition.
        changed_at: DateTime<Utc>,
    },
    PaymentReceived {
        payment_id: Uuid,
        order_number: String,
        customer_id: Option<Uuid>,
        customer_name: String,
        phone: String,
        /// Decimal amount as a string, e.g. "150.00"
        amount: String,
    },
    InstallmentReminder {
        installment_id: Uuid,
        customer_id: Option<Uuid>,
        customer_name: String,
        phone: String,
        installment_number: i32,
        amount: String,
        due_date: NaiveDate,
        days_left: i64,
    },
    Campaign {
        campaign_id: Uuid,
        customer_id: Option<Uuid>,
        customer_name: String,
        phone: String,
        template_name: Option<String>,
        content: Option<String>,
    },
    EvaluationRequest {
        order_id: Uuid,
        customer_id: Option<Uuid>,
        customer_name: String,
        phone: String,
        link: String,
    },
}

impl NotificationEvent {
    /// Value stored in `notification_type` and sent in the envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::OrderStatusChanged { .. } => "order_status_changed",
            NotificationEvent::PaymentReceived { .. } => "payment_received",
            NotificationEvent::InstallmentReminder { .. } => "installment_reminder",
            NotificationEvent::Campaign { .. } => "campaign",
            NotificationEvent::EvaluationRequest { .. } => "evaluation_request",
        }
    }

    pub fn webhook_type(&self) -> WebhookType {
        match self {
            NotificationEvent::Campaign { .. } => WebhookType::BulkCampaign,
            NotificationEvent::EvaluationRequest { .. } => WebhookType::Evaluation,
            _ => WebhookType::Outgoing,
        }
    }

    pub fn phone(&self) -> &str {
        match self {
            NotificationEvent::OrderStatusChanged { phone, .. }
            | NotificationEvent::PaymentReceived { phone, .. }
            | NotificationEvent::InstallmentReminder { phone, .. }
            | NotificationEvent::Campaign { phone, .. }
            | NotificationEvent::EvaluationRequest { phone, .. } => phone,
        }
    }

    pub fn customer_id(&self) -> Option<Uuid> {
        match self {
            NotificationEvent::OrderStatusChanged { customer_id, .. }
            | NotificationEvent::PaymentReceived { customer_id, .. }
            | NotificationEvent::InstallmentReminder { customer_id, .. }
            | NotificationEvent::Campaign { customer_id, .. }
            | NotificationEvent::EvaluationRequest { customer_id, .. } => *customer_id,
        }
    }

    pub fn order_status(&self) -> Option<&str> {
        match self {
            NotificationEvent::OrderStatusChanged { status, .. } => Some(status),
            _ => None,
        }
    }

    pub fn dedupe_key(&self) -> DedupeKey {
        match self {
            NotificationEvent::OrderStatusChanged {
                order_id,
                status,
                changed_at,
                ..
            } => DedupeKey::for_event(self.kind(), order_id)
                .with(status)
                .with(changed_at.timestamp_millis()),
            NotificationEvent::PaymentReceived { payment_id, .. } => {
                DedupeKey::for_event(self.kind(), payment_id)
            }
            NotificationEvent::InstallmentReminder {
                installment_id,
                days_left,
                ..
            } => DedupeKey::for_event(self.kind(), installment_id).with(format!("d{days_left}")),
            NotificationEvent::Campaign {
                campaign_id, phone, ..
            } => DedupeKey::for_event(self.kind(), campaign_id).with(phone),
            NotificationEvent::EvaluationRequest { order_id, .. } => {
                DedupeKey::for_event(self.kind(), order_id)
            }
        }
    }

    /// Name of the stored template used for this event.
    pub fn template_name(&self) -> Option<String> {
        match self {
            NotificationEvent::OrderStatusChanged { status, .. } => {
                Some(format!("order_status_{status}"))
            }
            NotificationEvent::PaymentReceived { .. } => Some("payment_received".to_string()),
            NotificationEvent::InstallmentReminder { days_left, .. } => Some(
                match days_left {
                    2 => "installment_reminder_2days",
                    1 => "installment_reminder_1day",
                    _ => "installment_due_today",
                }
                .to_string(),
            ),
            NotificationEvent::Campaign { template_name, .. } => template_name.clone(),
            NotificationEvent::EvaluationRequest { .. } => {
                Some("evaluation_request".to_string())
            }
        }
    }

    /// Text used when no active stored template exists.
    pub fn fallback_template(&self) -> String {
        match self {
            NotificationEvent::OrderStatusChanged { .. } => {
                "Hello {{customer_name}}, your order {{order_number}} is now {{status}}.".to_string()
            }
            NotificationEvent::PaymentReceived { .. } => {
                "Hello {{customer_name}}, we received your payment of {{amount}} for order {{order_number}}. Thank you!"
                    .to_string()
            }
            NotificationEvent::InstallmentReminder { days_left, .. } => match days_left {
                0 => "Hello {{customer_name}}, installment #{{installment_number}} of {{amount}} is due today ({{due_date}})."
                    .to_string(),
                _ => "Hello {{customer_name}}, installment #{{installment_number}} of {{amount}} is due in {{days_left}} day(s) on {{due_date}}."
                    .to_string(),
            },
            NotificationEvent::Campaign { content, .. } => content.clone().unwrap_or_default(),
            NotificationEvent::EvaluationRequest { .. } => {
                "Hello {{customer_name}}, we would love your feedback: {{link}}".to_string()
            }
        }
    }

    pub fn variables(&self) -> TemplateVars {
        let mut vars = TemplateVars::new();
        let mut put = |k: &str, v: String| {
            vars.insert(k.to_string(), v);
        };

        match self {
            NotificationEvent::OrderStatusChanged {
                order_number,
                customer_name,
                phone,
                status,
                ..
            } => {
                put("order_number", order_number.clone());
                put("customer_name", customer_name.clone());
                put("phone", phone.clone());
                put("status", status.clone());
            }
            NotificationEvent::PaymentReceived {
                order_number,
                customer_name,
                phone,
                amount,
                ..
            } => {
                put("order_number", order_number.clone());
                put("customer_name", customer_name.clone());
                put("phone", phone.clone());
                put("amount", amount.clone());
            }
            NotificationEvent::InstallmentReminder {
                customer_name,
                phone,
                installment_number,
                amount,
                due_date,
                days_left,
                ..
            } => {
                put("customer_name", customer_name.clone());
                put("phone", phone.clone());
                put("installment_number", installment_number.to_string());
                put("amount", amount.clone());
                put("due_date", due_date.format("%Y-%m-%d").to_string());
                put("days_left", days_left.to_string());
            }
            NotificationEvent::Campaign {
                customer_name,
                phone,
                ..
            } => {
                put("customer_name", customer_name.clone());
                put("phone", phone.clone());
            }
            NotificationEvent::EvaluationRequest {
                customer_name,
                phone,
                link,
                ..
            } => {
                put("customer_name", customer_name.clone());
                put("phone", phone.clone());
                put("link", link.clone());
            }
        }

        vars
    }

    /// Presence checks performed before anything is enqueued.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.phone().trim().is_empty() {
            return Err(DomainError::InvalidInput("phone is required".to_string()));
        }
        if let NotificationEvent::Campaign {
            template_name,
            content,
            ..
        } = self
        {
            let has_content = content.as_deref().is_some_and(|c| !c.trim().is_empty());
            if template_name.is_none() && !has_content {
                return Err(DomainError::InvalidInput(
                    "campaign needs a template_name or content".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(phone: &str) -> NotificationEvent {
        NotificationEvent::PaymentReceived {
            payment_id: Uuid::nil(),
            order_number: "ORD-1".to_string(),
            customer_id: None,
            customer_name: "Sara".to_string(),
            phone: phone.to_string(),
            amount: "150.00".to_string(),
        }
    }

    #[test]
    fn deserializes_tagged_event() {
        let json = serde_json::json!({
            "event": "evaluation_request",
            "order_id": Uuid::nil(),
            "customer_id": null,
            "customer_name": "Sara",
            "phone": "+966500000000",
            "link": "https://survey.example.com/1"
        });
        let event: NotificationEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event.kind(), "evaluation_request");
        assert_eq!(event.webhook_type(), WebhookType::Evaluation);
    }

    #[test]
    fn dedupe_key_is_stable_for_same_payment() {
        assert_eq!(payment("1").dedupe_key(), payment("1").dedupe_key());
        assert_eq!(
            payment("1").dedupe_key().as_str(),
            format!("payment_received_{}", Uuid::nil())
        );
    }

    #[test]
    fn reminder_key_carries_day_offset() {
        let reminder = |days_left| NotificationEvent::InstallmentReminder {
            installment_id: Uuid::nil(),
            customer_id: None,
            customer_name: "Sara".to_string(),
            phone: "+966500000000".to_string(),
            installment_number: 3,
            amount: "100.00".to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            days_left,
        };
        assert_ne!(reminder(2).dedupe_key(), reminder(1).dedupe_key());
        assert_eq!(
            reminder(2).template_name().as_deref(),
            Some("installment_reminder_2days")
        );
        assert_eq!(
            reminder(0).template_name().as_deref(),
            Some("installment_due_today")
        );
        assert_eq!(reminder(1).variables()["due_date"], "2026-10-20");
    }

    #[test]
    fn order_status_transitions_get_distinct_keys() {
        let change = |status: &str, secs| NotificationEvent::OrderStatusChanged {
            order_id: Uuid::nil(),
            order_number: "ORD-1".to_string(),
            customer_id: None,
            customer_name: "Sara".to_string(),
            phone: "+966500000000".to_string(),
            status: status.to_string(),
            changed_at: DateTime::from_timestamp(secs, 0).unwrap(),
        };
        assert_ne!(
            change("ready", 100).dedupe_key(),
            change("ready", 200).dedupe_key()
        );
        assert_eq!(change("ready", 100).dedupe_key(), change("ready", 100).dedupe_key());
        assert_eq!(change("ready", 100).order_status(), Some("ready"));
    }

    #[test]
    fn blank_phone_is_rejected() {
        assert!(payment("  ").validate().is_err());
        assert!(payment("+966500000000").validate().is_ok());
    }

    #[test]
    fn campaign_requires_template_or_content() {
        let campaign = NotificationEvent::Campaign {
            campaign_id: Uuid::nil(),
            customer_id: None,
            customer_name: "Sara".to_string(),
            phone: "+966500000000".to_string(),
            template_name: None,
            content: Some("   ".to_string()),
        };
        assert!(campaign.validate().is_err());
        assert_eq!(campaign.webhook_type(), WebhookType::BulkCampaign);
    }
}
