use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewOrderInput {
    pub customer_id: Uuid,
    pub order_number: String,
    pub status: String,
    pub total_amount: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub order_number: String,
    pub status: String,
    pub total_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order joined with the customer contact needed to notify about it.
#[derive(Debug, Clone)]
pub struct OrderContact {
    pub order: OrderView,
    pub customer_name: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct PaymentView {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: BigDecimal,
    pub method: String,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentInput {
    pub order_id: Uuid,
    pub amount: BigDecimal,
    pub method: String,
}

#[derive(Debug, Clone)]
pub struct BusinessSummary {
    pub customers: i64,
    pub orders: i64,
    pub payments_total: BigDecimal,
}
