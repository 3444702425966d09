//! In-memory fakes of the repository and transport ports for service tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::notification_service::NotificationService;
use crate::domain::customer::{Customer, CustomerUpdate, NewCustomer};
use crate::domain::errors::DomainError;
use crate::domain::events::NotificationEvent;
use crate::domain::installment::{DueInstallment, ReminderSlot};
use crate::domain::message::{EnqueueOutcome, Message, MessageStats, MessageStatus, NewMessage};
use crate::domain::order::{
    BusinessSummary, ListResult, NewOrderInput, NewPaymentInput, OrderContact, OrderView,
    PaymentView,
};
use crate::domain::ports::{
    CustomerRepository, InstallmentRepository, MessageRepository, OrderRepository,
    TemplateRepository, WebhookRepository, WebhookTransport,
};
use crate::domain::retry::RetryPolicy;
use crate::domain::webhook::{
    TransportError, WebhookRequest, WebhookResponse, WebhookSetting, WebhookType,
};

#[derive(Default)]
struct State {
    messages: Vec<Message>,
    webhooks: Vec<WebhookSetting>,
    templates: HashMap<String, String>,
    customers: Vec<Customer>,
    installments: Vec<DueInstallment>,
    orders: Vec<OrderView>,
    payments: Vec<PaymentView>,
    fail_mark_reminded: bool,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn add_webhook(&self, setting: WebhookSetting) {
        self.state.lock().unwrap().webhooks.push(setting);
    }

    pub fn add_template(&self, name: &str, content: &str) {
        self.state
            .lock()
            .unwrap()
            .templates
            .insert(name.to_string(), content.to_string());
    }

    pub fn add_installment(&self, installment: DueInstallment) {
        self.state.lock().unwrap().installments.push(installment);
    }

    pub fn fail_mark_reminded(&self, fail: bool) {
        self.state.lock().unwrap().fail_mark_reminded = fail;
    }

    pub fn installment(&self, id: Uuid) -> DueInstallment {
        self.state
            .lock()
            .unwrap()
            .installments
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .expect("installment should exist")
    }

    pub fn message(&self, id: Uuid) -> Message {
        self.find_message(id)
            .unwrap()
            .expect("message should exist")
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().unwrap().messages.clone()
    }

    pub fn message_count(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    pub fn customers(&self) -> Vec<Customer> {
        self.state.lock().unwrap().customers.clone()
    }

    /// Register a customer and an order of theirs; returns the order id.
    pub fn add_order(&self, order_number: &str, phone: &str) -> Uuid {
        let customer = self
            .create_customer(NewCustomer {
                name: "Sara".to_string(),
                phone: phone.to_string(),
                email: None,
                agency_id: None,
            })
            .expect("customer");
        self.create(NewOrderInput {
            customer_id: customer.id,
            order_number: order_number.to_string(),
            status: "new".to_string(),
            total_amount: BigDecimal::from(300),
        })
        .expect("order")
    }

    /// Force `next_attempt_at` so a row becomes due at `at`.
    pub fn set_next_attempt(&self, id: Uuid, at: Option<DateTime<Utc>>) {
        let mut state = self.state.lock().unwrap();
        if let Some(m) = state.messages.iter_mut().find(|m| m.id == id) {
            m.next_attempt_at = at;
        }
    }
}

fn is_due(m: &Message, now: DateTime<Utc>) -> bool {
    match m.status {
        MessageStatus::Pending => m.next_attempt_at.map_or(true, |at| at <= now),
        MessageStatus::Failed => m.next_attempt_at.is_some_and(|at| at <= now),
        _ => false,
    }
}

impl MessageRepository for InMemoryStore {
    fn enqueue(&self, message: NewMessage) -> Result<EnqueueOutcome, DomainError> {
        let mut state = self.state.lock().unwrap();
        if let Some(key) = &message.dedupe_key {
            if let Some(existing) = state
                .messages
                .iter()
                .find(|m| m.dedupe_key.as_ref() == Some(key))
            {
                return Ok(EnqueueOutcome::Duplicate(existing.id));
            }
        }
        let id = Uuid::new_v4();
        state.messages.push(Message {
            id,
            from_number: message.from_number,
            to_number: message.to_number,
            message_type: message.message_type,
            content: message.content,
            status: message.status,
            dedupe_key: message.dedupe_key,
            customer_id: message.customer_id,
            notification_type: message.notification_type,
            webhook_type: message.webhook_type,
            order_status: message.order_status,
            attempt_count: 0,
            next_attempt_at: message.next_attempt_at,
            sent_at: None,
            error_message: None,
            created_at: Utc::now(),
        });
        Ok(EnqueueOutcome::Inserted(id))
    }

    fn find_message(&self, id: Uuid) -> Result<Option<Message>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state.messages.iter().find(|m| m.id == id).cloned())
    }

    fn claim_due(
        &self,
        limit: i64,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<Message>, DomainError> {
        let mut state = self.state.lock().unwrap();
        let mut claimed = Vec::new();
        for m in state.messages.iter_mut() {
            if claimed.len() as i64 >= limit {
                break;
            }
            if is_due(m, now) {
                m.next_attempt_at = Some(lease_until);
                claimed.push(m.clone());
            }
        }
        Ok(claimed)
    }

    fn renew_lease(
        &self,
        id: Uuid,
        held: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.lock().unwrap();
        match state.messages.iter_mut().find(|m| m.id == id) {
            Some(m)
                if matches!(m.status, MessageStatus::Pending | MessageStatus::Failed)
                    && m.next_attempt_at == Some(held) =>
            {
                m.next_attempt_at = Some(until);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn record_sent(
        &self,
        id: Uuid,
        lease: DateTime<Utc>,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.lock().unwrap();
        let Some(m) = state
            .messages
            .iter_mut()
            .find(|m| m.id == id && m.next_attempt_at == Some(lease))
        else {
            return Ok(false);
        };
        m.status = MessageStatus::Sent;
        m.sent_at = Some(sent_at);
        m.attempt_count += 1;
        m.next_attempt_at = None;
        m.error_message = None;
        Ok(true)
    }

    fn record_failure(
        &self,
        id: Uuid,
        lease: DateTime<Utc>,
        error: &str,
        next_attempt_at: Option<DateTime<Utc>>,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.lock().unwrap();
        let Some(m) = state
            .messages
            .iter_mut()
            .find(|m| m.id == id && m.next_attempt_at == Some(lease))
        else {
            return Ok(false);
        };
        m.status = MessageStatus::Failed;
        m.error_message = Some(error.to_string());
        m.attempt_count += 1;
        m.next_attempt_at = next_attempt_at;
        Ok(true)
    }

    fn count_due(&self, now: DateTime<Utc>) -> Result<i64, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state.messages.iter().filter(|m| is_due(m, now)).count() as i64)
    }

    fn message_stats(&self) -> Result<MessageStats, DomainError> {
        let state = self.state.lock().unwrap();
        let mut stats = MessageStats::default();
        for m in &state.messages {
            match m.status {
                MessageStatus::Pending => stats.pending += 1,
                MessageStatus::Sent => stats.sent += 1,
                MessageStatus::Failed => {
                    stats.failed += 1;
                    if m.next_attempt_at.is_none() {
                        stats.dead_lettered += 1;
                    }
                }
                MessageStatus::Received => stats.received += 1,
            }
        }
        Ok(stats)
    }
}

impl WebhookRepository for InMemoryStore {
    fn active_webhooks(&self) -> Result<Vec<WebhookSetting>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state.webhooks.iter().filter(|w| w.is_active).cloned().collect())
    }
}

impl TemplateRepository for InMemoryStore {
    fn active_template(&self, name: &str) -> Result<Option<String>, DomainError> {
        Ok(self.state.lock().unwrap().templates.get(name).cloned())
    }
}

impl CustomerRepository for InMemoryStore {
    fn find_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state.customers.iter().find(|c| c.phone == phone).cloned())
    }

    fn create_customer(&self, customer: NewCustomer) -> Result<Customer, DomainError> {
        let mut state = self.state.lock().unwrap();
        if state.customers.iter().any(|c| c.phone == customer.phone) {
            return Err(DomainError::InvalidInput("phone already registered".to_string()));
        }
        let created = Customer {
            id: Uuid::new_v4(),
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
            agency_id: customer.agency_id,
            created_at: Utc::now(),
        };
        state.customers.push(created.clone());
        Ok(created)
    }

    fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state.customers.iter().find(|c| c.id == id).cloned())
    }

    fn list_customers(&self, page: i64, limit: i64) -> Result<(Vec<Customer>, i64), DomainError> {
        let state = self.state.lock().unwrap();
        let offset = ((page - 1) * limit).max(0) as usize;
        let items = state
            .customers
            .iter()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((items, state.customers.len() as i64))
    }

    fn update_customer(&self, id: Uuid, update: CustomerUpdate) -> Result<Customer, DomainError> {
        let mut state = self.state.lock().unwrap();
        let c = state
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DomainError::NotFound("Customer"))?;
        if let Some(name) = update.name {
            c.name = name;
        }
        if let Some(phone) = update.phone {
            c.phone = phone;
        }
        if update.email.is_some() {
            c.email = update.email;
        }
        Ok(c.clone())
    }

    fn delete_customer(&self, id: Uuid) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        let before = state.customers.len();
        state.customers.retain(|c| c.id != id);
        if state.customers.len() == before {
            return Err(DomainError::NotFound("Customer"));
        }
        Ok(())
    }
}

impl State {
    fn contact(&self, order: &OrderView) -> Result<OrderContact, DomainError> {
        let customer = self
            .customers
            .iter()
            .find(|c| c.id == order.customer_id)
            .ok_or(DomainError::NotFound("Customer"))?;
        Ok(OrderContact {
            order: order.clone(),
            customer_name: customer.name.clone(),
            phone: customer.phone.clone(),
        })
    }
}

impl OrderRepository for InMemoryStore {
    fn create(&self, order: NewOrderInput) -> Result<Uuid, DomainError> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let id = Uuid::new_v4();
        state.orders.push(OrderView {
            id,
            customer_id: order.customer_id,
            order_number: order.order_number,
            status: order.status,
            total_amount: order.total_amount,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let state = self.state.lock().unwrap();
        let offset = ((page - 1) * limit).max(0) as usize;
        Ok(ListResult {
            items: state
                .orders
                .iter()
                .skip(offset)
                .take(limit as usize)
                .cloned()
                .collect(),
            total: state.orders.len() as i64,
        })
    }

    fn update_status(&self, id: Uuid, status: &str) -> Result<OrderContact, DomainError> {
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(DomainError::NotFound("Order"))?;
        order.status = status.to_string();
        order.updated_at = Utc::now();
        let order = order.clone();
        state.contact(&order)
    }

    fn list_payments(&self, order_id: Option<Uuid>) -> Result<Vec<PaymentView>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .payments
            .iter()
            .filter(|p| order_id.map_or(true, |id| p.order_id == id))
            .cloned()
            .collect())
    }

    fn create_payment(
        &self,
        payment: NewPaymentInput,
    ) -> Result<(PaymentView, OrderContact), DomainError> {
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .iter()
            .find(|o| o.id == payment.order_id)
            .cloned()
            .ok_or(DomainError::NotFound("Order"))?;
        let contact = state.contact(&order)?;
        let recorded = PaymentView {
            id: Uuid::new_v4(),
            order_id: payment.order_id,
            amount: payment.amount,
            method: payment.method,
            paid_at: Utc::now(),
        };
        state.payments.push(recorded.clone());
        Ok((recorded, contact))
    }

    fn summary(&self) -> Result<BusinessSummary, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(BusinessSummary {
            customers: state.customers.len() as i64,
            orders: state.orders.len() as i64,
            payments_total: state.payments.iter().map(|p| p.amount.clone()).sum(),
        })
    }
}

impl InstallmentRepository for InMemoryStore {
    fn due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DueInstallment>, DomainError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .installments
            .iter()
            .filter(|i| i.due_date >= from && i.due_date <= to)
            .cloned()
            .collect())
    }

    fn mark_reminded(&self, id: Uuid, slot: ReminderSlot) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_mark_reminded {
            return Err(DomainError::Internal("connection reset".to_string()));
        }
        let inst = state
            .installments
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(DomainError::NotFound("Installment"))?;
        match slot {
            ReminderSlot::TwoDays => inst.reminder_sent_2days = true,
            ReminderSlot::OneDay => inst.reminder_sent_1day = true,
            ReminderSlot::DueToday => {}
        }
        Ok(())
    }
}

/// Records every request and replays scripted responses, defaulting to 200.
#[derive(Clone, Default)]
pub struct FakeTransport {
    requests: Arc<Mutex<Vec<WebhookRequest>>>,
    responses: Arc<Mutex<VecDeque<Result<WebhookResponse, TransportError>>>>,
    delay: Duration,
}

impl FakeTransport {
    /// A transport whose every call takes `delay`.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn push(&self, response: Result<WebhookResponse, TransportError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<WebhookRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl WebhookTransport for FakeTransport {
    async fn post(&self, request: WebhookRequest) -> Result<WebhookResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(WebhookResponse {
                    status: 200,
                    body: "ok".to_string(),
                })
            })
    }
}

pub fn test_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_secs(60),
        max_delay: Duration::from_secs(600),
    }
}

pub fn test_service(
    store: InMemoryStore,
    transport: FakeTransport,
) -> NotificationService<InMemoryStore, FakeTransport> {
    leased_service(store, transport, Duration::from_secs(120))
}

pub fn leased_service(
    store: InMemoryStore,
    transport: FakeTransport,
    lease: Duration,
) -> NotificationService<InMemoryStore, FakeTransport> {
    NotificationService::new(store, transport, test_policy(), lease)
}

pub fn webhook(name: &str, kind: WebhookType) -> WebhookSetting {
    WebhookSetting {
        id: Uuid::new_v4(),
        webhook_name: name.to_string(),
        webhook_type: kind,
        webhook_url: format!("https://hooks.example.com/{name}"),
        is_active: true,
        order_statuses: None,
        secret_key: None,
    }
}

pub fn event_for_payment(phone: &str) -> NotificationEvent {
    NotificationEvent::PaymentReceived {
        payment_id: Uuid::from_u128(0x5eed),
        order_number: "ORD-1001".to_string(),
        customer_id: None,
        customer_name: "Sara".to_string(),
        phone: phone.to_string(),
        amount: "150.00".to_string(),
    }
}
