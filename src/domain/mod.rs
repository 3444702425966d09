pub mod api_key;
pub mod customer;
pub mod dedupe;
pub mod errors;
pub mod events;
pub mod inbound;
pub mod installment;
pub mod message;
pub mod order;
pub mod ports;
pub mod retry;
pub mod session;
pub mod template;
pub mod webhook;
