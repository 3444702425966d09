use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::blocking;
use crate::application::notification_service::{DeliveryOutcome, NotifyOutcome};
use crate::application::queue_processor::BatchReport;
use crate::domain::events::NotificationEvent;
use crate::domain::message::Message;
use crate::domain::ports::MessageRepository;
use crate::domain::webhook::WebhookType;
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotificationRequest {
    #[serde(flatten)]
    pub event: NotificationEvent,
    /// Prefer the active webhook with this name when it fits the event.
    pub webhook_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Duplicate,
    Sent,
    Failed,
    /// The queue processor is already delivering this message.
    InFlight,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub message_id: Uuid,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    /// Unset when the message was dead-lettered or not retried.
    pub next_attempt_at: Option<DateTime<Utc>>,
}

impl From<NotifyOutcome> for NotificationResponse {
    fn from(outcome: NotifyOutcome) -> Self {
        match outcome {
            NotifyOutcome::Duplicate { message_id } => Self {
                message_id,
                status: DeliveryStatus::Duplicate,
                error: None,
                next_attempt_at: None,
            },
            NotifyOutcome::Dispatched {
                message_id,
                delivery: DeliveryOutcome::LeaseLost,
            } => Self {
                message_id,
                status: DeliveryStatus::InFlight,
                error: None,
                next_attempt_at: None,
            },
            NotifyOutcome::Dispatched {
                message_id,
                delivery: DeliveryOutcome::Sent { .. },
            } => Self {
                message_id,
                status: DeliveryStatus::Sent,
                error: None,
                next_attempt_at: None,
            },
            NotifyOutcome::Dispatched {
                message_id,
                delivery:
                    DeliveryOutcome::Failed {
                        error,
                        next_attempt_at,
                    },
            } => Self {
                message_id,
                status: DeliveryStatus::Failed,
                error: Some(error),
                next_attempt_at,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub message_type: String,
    pub message_content: String,
    pub status: String,
    pub dedupe_key: Option<String>,
    pub customer_id: Option<Uuid>,
    pub notification_type: Option<String>,
    pub webhook_type: WebhookType,
    pub attempt_count: i32,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            from_number: m.from_number,
            to_number: m.to_number,
            message_type: m.message_type,
            message_content: m.content,
            status: m.status.to_string(),
            dedupe_key: m.dedupe_key,
            customer_id: m.customer_id,
            notification_type: m.notification_type,
            webhook_type: m.webhook_type,
            attempt_count: m.attempt_count,
            next_attempt_at: m.next_attempt_at,
            sent_at: m.sent_at,
            error_message: m.error_message,
            created_at: m.created_at,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /notifications
///
/// Renders the event's template, queues the message and attempts delivery
/// right away. Delivery failures are reported in the body, not as HTTP errors.
#[utoipa::path(
    post,
    path = "/notifications",
    request_body = NotificationRequest,
    responses(
        (status = 200, description = "Notification queued", body = NotificationResponse),
        (status = 400, description = "Invalid event"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Internal server error"),
    ),
    security(("api_key" = [])),
    tag = "notifications"
)]
pub async fn notify(
    state: web::Data<AppState>,
    body: web::Json<NotificationRequest>,
) -> Result<HttpResponse, AppError> {
    let NotificationRequest {
        event,
        webhook_name,
    } = body.into_inner();

    let outcome = state.notifier.notify(event, webhook_name).await?;
    Ok(HttpResponse::Ok().json(NotificationResponse::from(outcome)))
}

/// POST /messages/process
#[utoipa::path(
    post,
    path = "/messages/process",
    responses(
        (status = 200, description = "Queue drained", body = BatchReport),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Internal server error"),
    ),
    security(("api_key" = [])),
    tag = "notifications"
)]
pub async fn process_queue(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let report = state.processor.drain().await?;
    Ok(HttpResponse::Ok().json(report))
}

/// GET /messages/{id}
#[utoipa::path(
    get,
    path = "/messages/{id}",
    params(
        ("id" = Uuid, Path, description = "Message UUID"),
    ),
    responses(
        (status = 200, description = "Message found", body = MessageResponse),
        (status = 404, description = "Message not found"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Internal server error"),
    ),
    security(("api_key" = [])),
    tag = "notifications"
)]
pub async fn get_message(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let message = blocking(&state.store, move |s| s.find_message(id))
        .await?
        .ok_or(AppError::NotFound("Message"))?;

    Ok(HttpResponse::Ok().json(MessageResponse::from(message)))
}
