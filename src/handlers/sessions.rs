//! Pairing-session state pushed by the WhatsApp pairing proxy.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::blocking;
use crate::domain::ports::SessionRepository;
use crate::domain::session::{SessionStatus, SessionUpdate, WhatsAppSession};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenSessionRequest {
    pub session_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSessionRequest {
    pub status: SessionStatus,
    pub qr_code: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub session_name: String,
    pub status: SessionStatus,
    pub qr_code: Option<String>,
    pub phone_number: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<WhatsAppSession> for SessionResponse {
    fn from(s: WhatsAppSession) -> Self {
        Self {
            id: s.id,
            session_name: s.session_name,
            status: s.status,
            qr_code: s.qr_code,
            phone_number: s.phone_number,
            updated_at: s.updated_at,
        }
    }
}

fn session_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("session_name is required".to_string()));
    }
    Ok(name.to_string())
}

/// POST /whatsapp/sessions
///
/// Returns the named session, creating it as `pending` when it does not exist.
#[utoipa::path(
    post,
    path = "/whatsapp/sessions",
    request_body = OpenSessionRequest,
    responses(
        (status = 200, description = "Session opened", body = SessionResponse),
        (status = 400, description = "Missing session name"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Internal server error"),
    ),
    security(("api_key" = [])),
    tag = "sessions"
)]
pub async fn open_session(
    state: web::Data<AppState>,
    body: web::Json<OpenSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let name = session_name(&body.session_name)?;

    let session = blocking(&state.store, move |s| s.open_session(&name)).await?;
    Ok(HttpResponse::Ok().json(SessionResponse::from(session)))
}

/// PUT /whatsapp/sessions/{name}
#[utoipa::path(
    put,
    path = "/whatsapp/sessions/{name}",
    params(
        ("name" = String, Path, description = "Session name"),
    ),
    request_body = UpdateSessionRequest,
    responses(
        (status = 200, description = "Session updated", body = SessionResponse),
        (status = 404, description = "Session not found"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Internal server error"),
    ),
    security(("api_key" = [])),
    tag = "sessions"
)]
pub async fn update_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let name = session_name(&path.into_inner())?;
    let body = body.into_inner();
    let update = SessionUpdate {
        status: body.status,
        qr_code: body.qr_code,
        phone_number: body.phone_number,
    };

    log::info!("Session '{}' is now {}", name, update.status);
    let session = blocking(&state.store, move |s| s.update_session(&name, update)).await?;
    Ok(HttpResponse::Ok().json(SessionResponse::from(session)))
}

/// GET /whatsapp/sessions/{name}
#[utoipa::path(
    get,
    path = "/whatsapp/sessions/{name}",
    params(
        ("name" = String, Path, description = "Session name"),
    ),
    responses(
        (status = 200, description = "Session found", body = SessionResponse),
        (status = 404, description = "Session not found"),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Internal server error"),
    ),
    security(("api_key" = [])),
    tag = "sessions"
)]
pub async fn get_session(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let name = path.into_inner();

    let session = blocking(&state.store, move |s| s.find_session(&name))
        .await?
        .ok_or(AppError::NotFound("Session"))?;
    Ok(HttpResponse::Ok().json(SessionResponse::from(session)))
}
