//! Inbound webhook payloads.
//!
//! The workflow engine forwards incoming WhatsApp messages in one of three
//! shapes. Anything that matches none of them is rejected rather than guessed at.

use serde::Deserialize;
use utoipa::ToSchema;

use super::errors::DomainError;

/// `{ "message": { "from": ..., "text": ... } }`
///
/// The text aliases are alternatives: a body carrying two of them is
/// ambiguous and rejected.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NestedMessage {
    pub from: String,
    #[serde(alias = "body", alias = "content")]
    pub text: String,
    pub to: Option<String>,
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    #[serde(alias = "pushName")]
    pub name: Option<String>,
}

/// `{ "from": ..., "message": "..." }`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FlatMessage {
    pub from: String,
    pub message: String,
    pub to: Option<String>,
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    #[serde(alias = "pushName")]
    pub name: Option<String>,
}

/// `{ "data": { "from": ..., "message": "..." } }`
///
/// As with [`NestedMessage`], only one text field may be present.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EnvelopeData {
    pub from: String,
    #[serde(alias = "body", alias = "text")]
    pub message: String,
    pub to: Option<String>,
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    #[serde(alias = "pushName")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum InboundPayload {
    Nested { message: NestedMessage },
    Flat(FlatMessage),
    Envelope { data: EnvelopeData },
}

/// Canonical form of an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub from: String,
    pub to: Option<String>,
    pub content: String,
    pub message_type: String,
    pub sender_name: Option<String>,
}

impl InboundPayload {
    /// Parse a raw JSON body, failing closed on unknown shapes.
    pub fn parse(body: &[u8]) -> Result<Self, DomainError> {
        serde_json::from_slice(body).map_err(|_| {
            DomainError::InvalidInput("unrecognized inbound payload".to_string())
        })
    }

    pub fn normalize(self) -> Result<InboundMessage, DomainError> {
        let (from, to, content, message_type, sender_name) = match self {
            InboundPayload::Nested { message } => (
                message.from,
                message.to,
                message.text,
                message.message_type,
                message.name,
            ),
            InboundPayload::Flat(m) => (m.from, m.to, m.message, m.message_type, m.name),
            InboundPayload::Envelope { data } => {
                (data.from, data.to, data.message, data.message_type, data.name)
            }
        };

        let from = normalize_phone(&from);
        if from.is_empty() {
            return Err(DomainError::InvalidInput("sender phone is required".to_string()));
        }
        if content.trim().is_empty() {
            return Err(DomainError::InvalidInput("message text is required".to_string()));
        }

        Ok(InboundMessage {
            from,
            to: to.map(|t| normalize_phone(&t)).filter(|t| !t.is_empty()),
            content,
            message_type: message_type.unwrap_or_else(|| "text".to_string()),
            sender_name: sender_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        })
    }
}

/// Strip formatting from a phone number, keeping digits and a leading `+`.
///
/// A WhatsApp JID suffix such as `@s.whatsapp.net` is dropped.
pub fn normalize_phone(raw: &str) -> String {
    let raw = raw.split('@').next().unwrap_or_default().trim();
    let mut out = String::with_capacity(raw.len());
    for (i, c) in raw.chars().enumerate() {
        if c.is_ascii_digit() || (i == 0 && c == '+') {
            out.push(c);
        }
    }
    if out == "+" {
        out.clear();
    }
    out
}
