use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::blocking;
use crate::domain::message::MessageStats;
use crate::domain::ports::MessageRepository;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageReport {
    pub pending: i64,
    pub sent: i64,
    pub failed: i64,
    pub received: i64,
    /// Failed messages that will not be retried.
    pub dead_lettered: i64,
}

impl From<MessageStats> for MessageReport {
    fn from(s: MessageStats) -> Self {
        Self {
            pending: s.pending,
            sent: s.sent,
            failed: s.failed,
            received: s.received,
            dead_lettered: s.dead_lettered,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryReport {
    pub customers: i64,
    pub orders: i64,
    pub payments_total: String,
}

/// GET /api/reports/messages
#[utoipa::path(
    get,
    path = "/api/reports/messages",
    responses((status = 200, description = "Message counts per status", body = MessageReport)),
    security(("api_key" = [])),
    tag = "reports"
)]
pub async fn message_report(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let stats = blocking(&state.store, |s| s.message_stats()).await?;
    Ok(HttpResponse::Ok().json(MessageReport::from(stats)))
}

/// GET /api/reports/summary
#[utoipa::path(
    get,
    path = "/api/reports/summary",
    responses((status = 200, description = "Business totals", body = SummaryReport)),
    security(("api_key" = [])),
    tag = "reports"
)]
pub async fn summary_report(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let summary = state.orders.summary().await?;
    Ok(HttpResponse::Ok().json(SummaryReport {
        customers: summary.customers,
        orders: summary.orders,
        payments_total: summary.payments_total.to_string(),
    }))
}
