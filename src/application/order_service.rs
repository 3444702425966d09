use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::events::NotificationEvent;
use crate::domain::order::{
    BusinessSummary, ListResult, NewOrderInput, NewPaymentInput, OrderContact, OrderView,
    PaymentView,
};
use crate::domain::ports::{OrderRepository, WebhookTransport};

use super::blocking;
use super::notification_service::{NotificationService, NotificationStore};

pub struct OrderService<S, T> {
    store: S,
    notifier: Arc<NotificationService<S, T>>,
}

impl<S, T> OrderService<S, T>
where
    S: NotificationStore + OrderRepository,
    T: WebhookTransport,
{
    pub fn new(store: S, notifier: Arc<NotificationService<S, T>>) -> Self {
        Self { store, notifier }
    }

    pub async fn create_order(&self, order: NewOrderInput) -> Result<Uuid, DomainError> {
        blocking(&self.store, move |s| s.create(order)).await
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        blocking(&self.store, move |s| s.find_by_id(id)).await
    }

    pub async fn list_orders(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        blocking(&self.store, move |s| s.list(page, limit)).await
    }

    /// Change the status and notify the customer.
    ///
    /// A failed notification does not fail the status change.
    pub async fn update_status(&self, id: Uuid, status: String) -> Result<OrderView, DomainError> {
        let new_status = status.clone();
        let contact = blocking(&self.store, move |s| s.update_status(id, &new_status)).await?;

        let event = NotificationEvent::OrderStatusChanged {
            order_id: contact.order.id,
            order_number: contact.order.order_number.clone(),
            customer_id: Some(contact.order.customer_id),
            customer_name: contact.customer_name.clone(),
            phone: contact.phone.clone(),
            status,
            changed_at: contact.order.updated_at,
        };
        self.notify_quietly(event).await;

        Ok(contact.order)
    }

    pub async fn list_payments(
        &self,
        order_id: Option<Uuid>,
    ) -> Result<Vec<PaymentView>, DomainError> {
        blocking(&self.store, move |s| s.list_payments(order_id)).await
    }

    /// Record a payment and thank the customer.
    pub async fn record_payment(&self, payment: NewPaymentInput) -> Result<PaymentView, DomainError> {
        let (payment, contact): (PaymentView, OrderContact) =
            blocking(&self.store, move |s| s.create_payment(payment)).await?;

        let event = NotificationEvent::PaymentReceived {
            payment_id: payment.id,
            order_number: contact.order.order_number,
            customer_id: Some(contact.order.customer_id),
            customer_name: contact.customer_name,
            phone: contact.phone,
            amount: payment.amount.to_string(),
        };
        self.notify_quietly(event).await;

        Ok(payment)
    }

    pub async fn summary(&self) -> Result<BusinessSummary, DomainError> {
        blocking(&self.store, |s| s.summary()).await
    }

    async fn notify_quietly(&self, event: NotificationEvent) {
        let kind = event.kind();
        if let Err(e) = self.notifier.notify(event, None).await {
            log::warn!("{} notification not sent: {}", kind, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::application::testing::{test_service, webhook, FakeTransport, InMemoryStore};
    use crate::domain::webhook::{TransportError, WebhookType};

    fn service(
        store: &InMemoryStore,
        transport: &FakeTransport,
    ) -> OrderService<InMemoryStore, FakeTransport> {
        let notifier = Arc::new(test_service(store.clone(), transport.clone()));
        OrderService::new(store.clone(), notifier)
    }

    #[tokio::test]
    async fn status_change_notifies_the_customer() {
        let store = InMemoryStore::default();
        store.add_webhook(webhook("orders", WebhookType::Outgoing));
        let transport = FakeTransport::default();
        let order_id = store.add_order("ORD-7", "+966500000007");

        let order = service(&store, &transport)
            .update_status(order_id, "ready".to_string())
            .await
            .unwrap();

        assert_eq!(order.status, "ready");
        let messages = store.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].to_number.as_deref(), Some("+966500000007"));
        assert_eq!(messages[0].order_status.as_deref(), Some("ready"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn failed_notification_does_not_fail_the_status_change() {
        let store = InMemoryStore::default();
        store.add_webhook(webhook("orders", WebhookType::Outgoing));
        let transport = FakeTransport::default();
        transport.push(Err(TransportError::Timeout("30s".to_string())));
        let order_id = store.add_order("ORD-8", "+966500000008");

        let order = service(&store, &transport)
            .update_status(order_id, "shipped".to_string())
            .await
            .unwrap();

        assert_eq!(order.status, "shipped");
        assert_eq!(store.message_count(), 1);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let store = InMemoryStore::default();
        let transport = FakeTransport::default();

        let err = service(&store, &transport)
            .update_status(Uuid::new_v4(), "ready".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound("Order")));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn payment_is_recorded_and_acknowledged() {
        let store = InMemoryStore::default();
        store.add_webhook(webhook("orders", WebhookType::Outgoing));
        let transport = FakeTransport::default();
        let order_id = store.add_order("ORD-9", "+966500000009");
        let service = service(&store, &transport);

        let payment = service
            .record_payment(NewPaymentInput {
                order_id,
                amount: BigDecimal::from_str("150.00").unwrap(),
                method: "transfer".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(payment.order_id, order_id);
        let messages = store.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].notification_type.as_deref(), Some("payment_received"));
        assert!(messages[0].content.contains("150.00"));

        let summary = service.summary().await.unwrap();
        assert_eq!(summary.orders, 1);
        assert_eq!(summary.payments_total, BigDecimal::from_str("150.00").unwrap());
    }
}
