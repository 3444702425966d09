use std::time::Instant;

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, Error, ResponseError};

use crate::application::blocking;
use crate::domain::api_key::ApiLogEntry;
use crate::domain::ports::ApiKeyRepository;
use crate::errors::AppError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject calls without an active API key and record every call in `api_logs`.
///
/// A failed log write never changes the response.
pub async fn api_key_guard<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let started = Instant::now();
    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("application state missing"))?;

    let method = req.method().to_string();
    let path = req.path().to_string();
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let verified = match presented {
        Some(key) if !key.is_empty() => {
            blocking(&state.store, move |s| s.verify_key(&key)).await
        }
        _ => Ok(None),
    };

    let (api_key_id, response) = match verified {
        Ok(Some(id)) => (Some(id), next.call(req).await?.map_into_left_body()),
        Ok(None) => {
            log::warn!("Rejected {} {}: missing or unknown API key", method, path);
            let rejected = AppError::Unauthorized.error_response();
            (None, req.into_response(rejected).map_into_right_body())
        }
        Err(e) => {
            let failed = AppError::from(e).error_response();
            (None, req.into_response(failed).map_into_right_body())
        }
    };

    let entry = ApiLogEntry {
        api_key_id,
        method,
        path,
        status_code: i32::from(response.status().as_u16()),
        latency_ms: i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX),
    };
    let (logged_method, logged_path) = (entry.method.clone(), entry.path.clone());
    if let Err(e) = blocking(&state.store, move |s| s.log_call(entry)).await {
        log::warn!(
            "Failed to record API call {} {}: {}",
            logged_method,
            logged_path,
            e
        );
    }

    Ok(response)
}
