use std::time::Duration;

use log::debug;
use reqwest::Client;

use crate::domain::ports::WebhookTransport;
use crate::domain::webhook::{TransportError, WebhookRequest, WebhookResponse};

pub const SECRET_HEADER: &str = "X-Webhook-Secret";

/// Posts webhook envelopes with reqwest; every call is bounded by the client timeout.
#[derive(Clone)]
pub struct HttpWebhookTransport {
    client: Client,
}

impl HttpWebhookTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

impl WebhookTransport for HttpWebhookTransport {
    async fn post(&self, request: WebhookRequest) -> Result<WebhookResponse, TransportError> {
        debug!("POST {}", request.url);

        let mut builder = self.client.post(&request.url).json(&request.body);
        if let Some(secret) = request.secret_key.as_deref() {
            builder = builder.header(SECRET_HEADER, secret);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(WebhookResponse { status, body })
    }
}
