pub mod api_key_repo;
pub mod customer_repo;
pub mod http_transport;
pub mod installment_repo;
pub mod message_repo;
pub mod models;
pub mod order_repo;
pub mod session_repo;
pub mod store;

#[cfg(test)]
pub(crate) mod test_db;

pub use http_transport::HttpWebhookTransport;
pub use store::DieselStore;
