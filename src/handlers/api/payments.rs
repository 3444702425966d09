use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::order::{NewPaymentInput, PaymentView};
use crate::errors::AppError;
use crate::state::AppState;

use super::{parse_amount, required};

#[derive(Debug, Deserialize, IntoParams)]
pub struct PaymentFilter {
    /// Only payments of this order.
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
    /// Decimal amount as a string, e.g. "150.00"
    pub amount: String,
    pub method: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: String,
    pub method: String,
    pub paid_at: String,
}

impl From<PaymentView> for PaymentResponse {
    fn from(p: PaymentView) -> Self {
        Self {
            id: p.id,
            order_id: p.order_id,
            amount: p.amount.to_string(),
            method: p.method,
            paid_at: p.paid_at.to_rfc3339(),
        }
    }
}

/// GET /api/payments
#[utoipa::path(
    get,
    path = "/api/payments",
    params(PaymentFilter),
    responses(
        (status = 200, description = "Payments, newest first", body = Vec<PaymentResponse>),
    ),
    security(("api_key" = [])),
    tag = "payments"
)]
pub async fn list_payments(
    state: web::Data<AppState>,
    query: web::Query<PaymentFilter>,
) -> Result<HttpResponse, AppError> {
    let payments = state.orders.list_payments(query.order_id).await?;

    let items: Vec<PaymentResponse> = payments.into_iter().map(PaymentResponse::from).collect();
    Ok(HttpResponse::Ok().json(items))
}

/// POST /api/payments
///
/// Records the payment and sends the customer a receipt over WhatsApp; a
/// failed notification does not fail the payment.
#[utoipa::path(
    post,
    path = "/api/payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 400, description = "Invalid amount"),
        (status = 404, description = "Order not found"),
    ),
    security(("api_key" = [])),
    tag = "payments"
)]
pub async fn create_payment(
    state: web::Data<AppState>,
    body: web::Json<CreatePaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let amount = parse_amount("amount", &body.amount)?;
    if amount == bigdecimal::BigDecimal::from(0) {
        return Err(AppError::BadRequest("amount must be positive".to_string()));
    }
    let payment = NewPaymentInput {
        order_id: body.order_id,
        amount,
        method: required("method", &body.method)?,
    };

    let recorded = state.orders.record_payment(payment).await?;
    Ok(HttpResponse::Created().json(PaymentResponse::from(recorded)))
}
