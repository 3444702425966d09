use std::sync::Arc;

use crate::application::inbound_service::InboundService;
use crate::application::notification_service::NotificationService;
use crate::application::order_service::OrderService;
use crate::application::queue_processor::QueueProcessor;
use crate::application::reminder_service::ReminderService;
use crate::config::Config;
use crate::db::DbPool;
use crate::infrastructure::{DieselStore, HttpWebhookTransport};

pub type Notifier = NotificationService<DieselStore, HttpWebhookTransport>;
pub type Processor = QueueProcessor<DieselStore, HttpWebhookTransport>;
pub type Reminders = ReminderService<DieselStore, HttpWebhookTransport>;
pub type Orders = OrderService<DieselStore, HttpWebhookTransport>;

/// Services shared by every handler and background worker.
#[derive(Clone)]
pub struct AppState {
    pub store: DieselStore,
    pub notifier: Arc<Notifier>,
    pub processor: Arc<Processor>,
    pub reminders: Arc<Reminders>,
    pub orders: Arc<Orders>,
    pub inbound: Arc<InboundService<DieselStore>>,
}

impl AppState {
    pub fn new(pool: DbPool, config: &Config) -> Result<Self, reqwest::Error> {
        let store = DieselStore::new(pool);
        let transport = HttpWebhookTransport::new(config.webhook_timeout)?;
        let notifier = Arc::new(NotificationService::new(
            store.clone(),
            transport,
            config.retry,
            config.dispatch_lease,
        ));

        Ok(Self {
            processor: Arc::new(QueueProcessor::new(
                notifier.clone(),
                config.processor_config(),
            )),
            reminders: Arc::new(ReminderService::new(notifier.clone())),
            orders: Arc::new(OrderService::new(store.clone(), notifier.clone())),
            inbound: Arc::new(InboundService::new(store.clone())),
            notifier,
            store,
        })
    }
}

/// Token the inbound webhook handshake must present.
#[derive(Debug, Clone)]
pub struct VerifyToken(pub String);
