pub mod api;
pub mod docs;
pub mod health;
pub mod jobs;
pub mod notifications;
pub mod sessions;
pub mod whatsapp;
