//! Inbound WhatsApp webhook: the subscription handshake and message receiver.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::inbound::InboundPayload;
use crate::errors::AppError;
use crate::state::{AppState, VerifyToken};

#[derive(Debug, Deserialize, IntoParams)]
pub struct VerifyQuery {
    /// Should be "subscribe"
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    /// Echoed back when verification succeeds
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InboundResponse {
    pub success: bool,
    pub message: String,
    pub message_id: Uuid,
    pub customer_id: Uuid,
}

/// GET /whatsapp-webhook
#[utoipa::path(
    get,
    path = "/whatsapp-webhook",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Challenge echoed back", body = String),
        (status = 403, description = "Mode or token mismatch"),
    ),
    tag = "whatsapp"
)]
pub async fn verify(
    token: web::Data<VerifyToken>,
    query: web::Query<VerifyQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();

    if query.mode.as_deref() != Some("subscribe") {
        log::warn!("Rejected webhook verification: mode={:?}", query.mode);
        return Err(AppError::Forbidden);
    }
    if query.verify_token.as_deref() != Some(token.0.as_str()) {
        log::warn!("Rejected webhook verification: token mismatch");
        return Err(AppError::Forbidden);
    }

    log::info!("Webhook verification successful");
    Ok(HttpResponse::Ok()
        .content_type("text/plain")
        .body(query.challenge.unwrap_or_default()))
}

/// POST /whatsapp-webhook
///
/// Accepts a message forwarded by the workflow engine in one of three shapes;
/// anything else is rejected with 400.
#[utoipa::path(
    post,
    path = "/whatsapp-webhook",
    request_body = InboundPayload,
    responses(
        (status = 200, description = "Message stored", body = InboundResponse),
        (status = 400, description = "Unrecognized payload"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "whatsapp"
)]
pub async fn receive(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let payload = InboundPayload::parse(&body)?;
    let receipt = state.inbound.receive(payload).await?;

    Ok(HttpResponse::Ok().json(InboundResponse {
        success: true,
        message: "Message received".to_string(),
        message_id: receipt.message_id,
        customer_id: receipt.customer_id,
    }))
}
