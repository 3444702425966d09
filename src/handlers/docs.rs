use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::api::{auth::API_KEY_HEADER, customers, orders, payments, reports};
use super::{health, jobs, notifications, sessions, whatsapp};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        whatsapp::verify,
        whatsapp::receive,
        notifications::notify,
        notifications::process_queue,
        notifications::get_message,
        jobs::installment_reminders,
        sessions::open_session,
        sessions::update_session,
        sessions::get_session,
        customers::list_customers,
        customers::get_customer,
        customers::create_customer,
        customers::update_customer,
        customers::delete_customer,
        orders::create_order,
        orders::get_order,
        orders::list_orders,
        orders::update_order_status,
        payments::list_payments,
        payments::create_payment,
        reports::message_report,
        reports::summary_report,
    ),
    modifiers(&ApiKeyAddon),
    tags(
        (name = "whatsapp", description = "Inbound WhatsApp webhook"),
        (name = "notifications", description = "Outbound message queue"),
        (name = "orders", description = "Orders, authenticated with x-api-key"),
    )
)]
pub struct ApiDoc;

struct ApiKeyAddon;

impl Modify for ApiKeyAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/whatsapp-webhook",
            "/notifications",
            "/api/orders/{id}/status",
            "/api/reports/summary",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_key"));
    }
}
