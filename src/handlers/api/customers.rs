use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::blocking;
use crate::domain::customer::{Customer, CustomerUpdate, NewCustomer};
use crate::domain::inbound::normalize_phone;
use crate::domain::ports::CustomerRepository;
use crate::errors::AppError;
use crate::state::AppState;

use super::{required, PageParams};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub agency_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub agency_id: Option<Uuid>,
    pub created_at: String,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            phone: c.phone,
            email: c.email,
            agency_id: c.agency_id,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListCustomersResponse {
    pub items: Vec<CustomerResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

fn phone(raw: &str) -> Result<String, AppError> {
    let phone = normalize_phone(raw);
    if phone.is_empty() {
        return Err(AppError::BadRequest(format!("invalid phone '{raw}'")));
    }
    Ok(phone)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    params(PageParams),
    responses(
        (status = 200, description = "Paginated list of customers", body = ListCustomersResponse),
        (status = 401, description = "Missing or invalid API key"),
    ),
    security(("api_key" = [])),
    tag = "customers"
)]
pub async fn list_customers(
    state: web::Data<AppState>,
    query: web::Query<PageParams>,
) -> Result<HttpResponse, AppError> {
    let (page, limit) = query.clamped();

    let (customers, total) =
        blocking(&state.store, move |s| s.list_customers(page, limit)).await?;

    Ok(HttpResponse::Ok().json(ListCustomersResponse {
        items: customers.into_iter().map(CustomerResponse::from).collect(),
        total,
        page,
        limit,
    }))
}

/// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 200, description = "Customer found", body = CustomerResponse),
        (status = 404, description = "Customer not found"),
    ),
    security(("api_key" = [])),
    tag = "customers"
)]
pub async fn get_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let customer = blocking(&state.store, move |s| s.find_customer(id))
        .await?
        .ok_or(AppError::NotFound("Customer"))?;

    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}

/// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerResponse),
        (status = 400, description = "Invalid input or phone already registered"),
    ),
    security(("api_key" = [])),
    tag = "customers"
)]
pub async fn create_customer(
    state: web::Data<AppState>,
    body: web::Json<CreateCustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let customer = NewCustomer {
        name: required("name", &body.name)?,
        phone: phone(&body.phone)?,
        email: body.email,
        agency_id: body.agency_id,
    };

    let created = blocking(&state.store, move |s| s.create_customer(customer)).await?;
    Ok(HttpResponse::Created().json(CustomerResponse::from(created)))
}

/// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 404, description = "Customer not found"),
    ),
    security(("api_key" = [])),
    tag = "customers"
)]
pub async fn update_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCustomerRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let body = body.into_inner();
    let update = CustomerUpdate {
        name: body.name.as_deref().map(|n| required("name", n)).transpose()?,
        phone: body.phone.as_deref().map(phone).transpose()?,
        email: body.email,
    };

    let updated = blocking(&state.store, move |s| s.update_customer(id, update)).await?;
    Ok(HttpResponse::Ok().json(CustomerResponse::from(updated)))
}

/// DELETE /api/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer UUID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 400, description = "Customer still referenced"),
        (status = 404, description = "Customer not found"),
    ),
    security(("api_key" = [])),
    tag = "customers"
)]
pub async fn delete_customer(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    blocking(&state.store, move |s| s.delete_customer(id)).await?;
    Ok(HttpResponse::NoContent().finish())
}
