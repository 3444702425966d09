use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{
    api_logs, customers, installment_payments, orders, payments, webhook_settings,
    whatsapp_messages, whatsapp_sessions,
};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerRow {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub agency_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = customers)]
pub struct NewCustomerRow {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub agency_id: Option<Uuid>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = customers)]
pub struct CustomerChangeset {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub order_number: String,
    pub status: String,
    pub total_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub order_number: String,
    pub status: String,
    pub total_amount: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: BigDecimal,
    pub method: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPaymentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: BigDecimal,
    pub method: String,
}

#[derive(Debug, Clone, Queryable, QueryableByName, Selectable, Identifiable)]
#[diesel(table_name = whatsapp_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    pub id: Uuid,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub message_type: String,
    pub message_content: String,
    pub status: String,
    pub dedupe_key: Option<String>,
    pub customer_id: Option<Uuid>,
    pub notification_type: Option<String>,
    pub webhook_type: String,
    pub order_status: Option<String>,
    pub attempt_count: i32,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = whatsapp_messages)]
pub struct NewMessageRow {
    pub id: Uuid,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub message_type: String,
    pub message_content: String,
    pub status: String,
    pub dedupe_key: Option<String>,
    pub customer_id: Option<Uuid>,
    pub notification_type: Option<String>,
    pub webhook_type: String,
    pub order_status: Option<String>,
    pub next_attempt_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = webhook_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WebhookSettingRow {
    pub id: Uuid,
    pub webhook_name: String,
    pub webhook_type: String,
    pub webhook_url: String,
    pub is_active: bool,
    pub order_statuses: Option<Vec<String>>,
    pub secret_key: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = webhook_settings)]
pub struct NewWebhookSettingRow {
    pub id: Uuid,
    pub webhook_name: String,
    pub webhook_type: String,
    pub webhook_url: String,
    pub is_active: bool,
    pub order_statuses: Option<Vec<String>>,
    pub secret_key: Option<String>,
}

/// Installment joined with its plan's customer.
#[derive(Debug, Clone, Queryable)]
pub struct DueInstallmentRow {
    pub id: Uuid,
    pub installment_number: i32,
    pub amount: BigDecimal,
    pub due_date: NaiveDate,
    pub reminder_sent_2days: bool,
    pub reminder_sent_1day: bool,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub phone: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = installment_payments)]
pub struct NewInstallmentPaymentRow {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub installment_number: i32,
    pub amount: BigDecimal,
    pub due_date: NaiveDate,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = whatsapp_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SessionRow {
    pub id: Uuid,
    pub session_name: String,
    pub status: String,
    pub qr_code: Option<String>,
    pub phone_number: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = api_logs)]
pub struct NewApiLogRow {
    pub id: Uuid,
    pub api_key_id: Option<Uuid>,
    pub method: String,
    pub path: String,
    pub status_code: i32,
    pub latency_ms: i32,
}
