use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::application::reminder_service::ReminderReport;
use crate::errors::AppError;
use crate::state::AppState;

/// POST /jobs/installment-reminders
///
/// Runs the reminder pass for today. Messages are only queued; the queue
/// processor delivers them.
#[utoipa::path(
    post,
    path = "/jobs/installment-reminders",
    responses(
        (status = 200, description = "Reminder pass finished", body = ReminderReport),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Internal server error"),
    ),
    security(("api_key" = [])),
    tag = "jobs"
)]
pub async fn installment_reminders(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let report = state.reminders.run(Utc::now().date_naive()).await?;
    Ok(HttpResponse::Ok().json(report))
}
