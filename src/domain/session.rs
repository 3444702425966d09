use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    QrReady,
    Connected,
    Disconnected,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::QrReady => "qr_ready",
            SessionStatus::Connected => "connected",
            SessionStatus::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SessionStatus::Pending),
            "qr_ready" => Ok(SessionStatus::QrReady),
            "connected" => Ok(SessionStatus::Connected),
            "disconnected" => Ok(SessionStatus::Disconnected),
            other => Err(DomainError::InvalidInput(format!(
                "unknown session status '{other}'"
            ))),
        }
    }
}

/// Pairing state of one WhatsApp account, owned by the database.
#[derive(Debug, Clone)]
pub struct WhatsAppSession {
    pub id: Uuid,
    pub session_name: String,
    pub status: SessionStatus,
    pub qr_code: Option<String>,
    pub phone_number: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionUpdate {
    pub status: SessionStatus,
    pub qr_code: Option<String>,
    pub phone_number: Option<String>,
}

impl SessionUpdate {
    /// A QR code only makes sense while waiting for a scan.
    pub fn qr_code_for_status(&self) -> Option<String> {
        match self.status {
            SessionStatus::QrReady => self.qr_code.clone(),
            _ => None,
        }
    }
}
