//! REST surface for the admin back office, guarded by `x-api-key`.

pub mod auth;
pub mod customers;
pub mod orders;
pub mod payments;
pub mod reports;

use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::AppError;

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
pub struct PageParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

impl PageParams {
    pub fn clamped(&self) -> (i64, i64) {
        (self.page.max(1), self.limit.clamp(1, 100))
    }
}

/// Parse a decimal amount sent as a string, e.g. "9.99".
pub(crate) fn parse_amount(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    let amount = BigDecimal::from_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("invalid {field} '{raw}'")))?;
    if amount < BigDecimal::from(0) {
        return Err(AppError::BadRequest(format!("{field} must not be negative")));
    }
    Ok(amount)
}

pub(crate) fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}
