use uuid::Uuid;

use crate::domain::customer::{Customer, NewCustomer};
use crate::domain::errors::DomainError;
use crate::domain::inbound::{InboundMessage, InboundPayload};
use crate::domain::message::NewMessage;
use crate::domain::ports::{CustomerRepository, MessageRepository};

use super::blocking;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundReceipt {
    pub message_id: Uuid,
    pub customer_id: Uuid,
    pub customer_created: bool,
}

/// Stores messages forwarded by the workflow engine from WhatsApp.
pub struct InboundService<S> {
    store: S,
}

impl<S> InboundService<S>
where
    S: CustomerRepository + MessageRepository + Clone,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn receive(&self, payload: InboundPayload) -> Result<InboundReceipt, DomainError> {
        let inbound = payload.normalize()?;
        let (customer, customer_created) = self.find_or_create_customer(&inbound).await?;

        let message = NewMessage {
            message_type: inbound.message_type,
            customer_id: Some(customer.id),
            ..NewMessage::received(inbound.from.clone(), inbound.to, inbound.content)
        };
        let message_id = blocking(&self.store, move |s| s.enqueue(message))
            .await?
            .id();

        log::info!(
            "Received WhatsApp message {} from {} (customer {})",
            message_id,
            inbound.from,
            customer.id
        );

        Ok(InboundReceipt {
            message_id,
            customer_id: customer.id,
            customer_created,
        })
    }

    async fn find_or_create_customer(
        &self,
        inbound: &InboundMessage,
    ) -> Result<(Customer, bool), DomainError> {
        let phone = inbound.from.clone();
        let lookup = phone.clone();
        if let Some(existing) =
            blocking(&self.store, move |s| s.find_customer_by_phone(&lookup)).await?
        {
            return Ok((existing, false));
        }

        let new_customer = NewCustomer {
            name: inbound.sender_name.clone().unwrap_or_else(|| phone.clone()),
            phone: phone.clone(),
            email: None,
            agency_id: None,
        };
        match blocking(&self.store, move |s| s.create_customer(new_customer)).await {
            Ok(created) => Ok((created, true)),
            Err(create_err) => {
                // Another request may have registered the number in the meantime.
                blocking(&self.store, move |s| s.find_customer_by_phone(&phone))
                    .await?
                    .map(|c| (c, false))
                    .ok_or(create_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::InMemoryStore;
    use crate::domain::message::MessageStatus;

    fn payload(json: serde_json::Value) -> InboundPayload {
        InboundPayload::parse(json.to_string().as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn unknown_sender_creates_customer_and_received_row() {
        let store = InMemoryStore::default();
        let service = InboundService::new(store.clone());

        let receipt = service
            .receive(payload(serde_json::json!({"from": "+966501234567", "message": "hi"})))
            .await
            .unwrap();

        assert!(receipt.customer_created);
        let customers = store.customers();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].phone, "+966501234567");

        let messages = store.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].status, MessageStatus::Received);
        assert_eq!(messages[0].customer_id, Some(customers[0].id));
        assert_eq!(messages[0].content, "hi");
        assert_eq!(messages[0].from_number.as_deref(), Some("+966501234567"));
        assert_eq!(messages[0].to_number, None);
    }

    #[tokio::test]
    async fn business_number_is_kept_when_present() {
        let store = InMemoryStore::default();
        let service = InboundService::new(store.clone());

        service
            .receive(payload(serde_json::json!({
                "from": "+966501234567", "to": "+966 500 000 000", "message": "hi"
            })))
            .await
            .unwrap();

        assert_eq!(store.messages()[0].to_number.as_deref(), Some("+966500000000"));
    }

    #[tokio::test]
    async fn known_sender_reuses_customer() {
        let store = InMemoryStore::default();
        let service = InboundService::new(store.clone());
        let body = serde_json::json!({"data": {"from": "+966501234567", "message": "one"}});

        let first = service.receive(payload(body.clone())).await.unwrap();
        let second = service.receive(payload(body)).await.unwrap();

        assert!(!second.customer_created);
        assert_eq!(first.customer_id, second.customer_id);
        assert_eq!(store.customers().len(), 1);
        assert_eq!(store.message_count(), 2);
    }

    #[tokio::test]
    async fn sender_name_becomes_customer_name() {
        let store = InMemoryStore::default();
        let service = InboundService::new(store.clone());

        service
            .receive(payload(serde_json::json!({
                "message": {"from": "+966501234567", "text": "hello", "pushName": "Sara"}
            })))
            .await
            .unwrap();

        assert_eq!(store.customers()[0].name, "Sara");
    }

    #[tokio::test]
    async fn blank_message_is_rejected_without_side_effects() {
        let store = InMemoryStore::default();
        let service = InboundService::new(store.clone());

        let err = service
            .receive(payload(serde_json::json!({"from": "+966501234567", "message": ""})))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert!(store.customers().is_empty());
        assert_eq!(store.message_count(), 0);
    }
}
