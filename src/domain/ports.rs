use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::api_key::ApiLogEntry;
use super::customer::{Customer, CustomerUpdate, NewCustomer};
use super::errors::DomainError;
use super::installment::{DueInstallment, ReminderSlot};
use super::message::{EnqueueOutcome, Message, MessageStats, NewMessage};
use super::order::{
    BusinessSummary, ListResult, NewOrderInput, NewPaymentInput, OrderContact, OrderView,
    PaymentView,
};
use super::session::{SessionUpdate, WhatsAppSession};
use super::webhook::{TransportError, WebhookRequest, WebhookResponse, WebhookSetting};

pub trait MessageRepository: Send + Sync + 'static {
    /// Insert a row; a dedupe-key clash yields the existing row's id.
    fn enqueue(&self, message: NewMessage) -> Result<EnqueueOutcome, DomainError>;
    fn find_message(&self, id: Uuid) -> Result<Option<Message>, DomainError>;
    /// Lease up to `limit` due rows until `lease_until` and return them.
    fn claim_due(
        &self,
        limit: i64,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<Message>, DomainError>;
    /// Move the lease from `held` to `until`; `false` when `held` is no longer current.
    fn renew_lease(
        &self,
        id: Uuid,
        held: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<bool, DomainError>;
    /// Mark sent if `lease` is still held; `false` when another sender took the row.
    fn record_sent(
        &self,
        id: Uuid,
        lease: DateTime<Utc>,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;
    /// Mark failed and bump the attempt count if `lease` is still held;
    /// `next_attempt_at = None` dead-letters.
    fn record_failure(
        &self,
        id: Uuid,
        lease: DateTime<Utc>,
        error: &str,
        next_attempt_at: Option<DateTime<Utc>>,
    ) -> Result<bool, DomainError>;
    fn count_due(&self, now: DateTime<Utc>) -> Result<i64, DomainError>;
    fn message_stats(&self) -> Result<MessageStats, DomainError>;
}

pub trait WebhookRepository: Send + Sync + 'static {
    fn active_webhooks(&self) -> Result<Vec<WebhookSetting>, DomainError>;
}

pub trait TemplateRepository: Send + Sync + 'static {
    /// Content of the active template called `name`, if any.
    fn active_template(&self, name: &str) -> Result<Option<String>, DomainError>;
}

pub trait CustomerRepository: Send + Sync + 'static {
    fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, DomainError>;
    fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DomainError>;
    fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DomainError>;
    fn list_customers(&self, page: i64, limit: i64) -> Result<(Vec<Customer>, i64), DomainError>;
    fn update_customer(&self, id: Uuid, update: CustomerUpdate) -> Result<Customer, DomainError>;
    fn delete_customer(&self, id: Uuid) -> Result<(), DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    fn create(&self, order: NewOrderInput) -> Result<Uuid, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError>;
    /// Set the status and return the order with its customer contact.
    fn update_status(&self, id: Uuid, status: &str) -> Result<OrderContact, DomainError>;
    fn list_payments(&self, order_id: Option<Uuid>) -> Result<Vec<PaymentView>, DomainError>;
    fn create_payment(
        &self,
        payment: NewPaymentInput,
    ) -> Result<(PaymentView, OrderContact), DomainError>;
    fn summary(&self) -> Result<BusinessSummary, DomainError>;
}

pub trait InstallmentRepository: Send + Sync + 'static {
    /// Pending installments with `from <= due_date <= to`.
    fn due_between(&self, from: NaiveDate, to: NaiveDate)
        -> Result<Vec<DueInstallment>, DomainError>;
    fn mark_reminded(&self, id: Uuid, slot: ReminderSlot) -> Result<(), DomainError>;
}

pub trait SessionRepository: Send + Sync + 'static {
    /// Return the named session, creating it as `pending` when absent.
    fn open_session(&self, name: &str) -> Result<WhatsAppSession, DomainError>;
    fn update_session(
        &self,
        name: &str,
        update: SessionUpdate,
    ) -> Result<WhatsAppSession, DomainError>;
    fn find_session(&self, name: &str) -> Result<Option<WhatsAppSession>, DomainError>;
}

pub trait ApiKeyRepository: Send + Sync + 'static {
    /// Id of the active key matching `key`, touching its `last_used_at`.
    fn verify_key(&self, key: &str) -> Result<Option<Uuid>, DomainError>;
    fn log_call(&self, entry: ApiLogEntry) -> Result<(), DomainError>;
}

/// Performs the HTTP call to a workflow-engine webhook.
pub trait WebhookTransport: 'static {
    fn post(
        &self,
        request: WebhookRequest,
    ) -> impl Future<Output = Result<WebhookResponse, TransportError>>;
}
