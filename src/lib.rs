pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod state;

use actix_web::middleware::{from_fn, Logger};
use actix_web::{web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::Config;
pub use db::{create_pool, DbPool};
pub use state::{AppState, VerifyToken};

use handlers::api::{auth, customers, orders, payments, reports};
use handlers::docs::ApiDoc;
use handlers::{health, jobs, notifications, sessions, whatsapp};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(
    pool: &DbPool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    if !applied.is_empty() {
        log::info!("Applied {} migration(s)", applied.len());
    }
    Ok(())
}

/// Start the queue processor and reminder scheduler on the current runtime.
pub fn spawn_workers(state: &AppState, config: &Config) {
    actix_web::rt::spawn(state.processor.clone().run(config.queue_poll_interval));
    actix_web::rt::spawn(state.reminders.clone().run_periodically(config.reminder_interval));
    log::info!(
        "Background workers started (queue every {:?}, reminders every {:?})",
        config.queue_poll_interval,
        config.reminder_interval
    );
}

/// Register every route.
///
/// Only `/health`, the inbound WhatsApp webhook and the API docs are open;
/// everything else requires an `x-api-key`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health))
        .service(
            web::resource("/whatsapp-webhook")
                .route(web::get().to(whatsapp::verify))
                .route(web::post().to(whatsapp::receive)),
        )
        .service(
            web::resource("/notifications")
                .wrap(from_fn(auth::api_key_guard))
                .route(web::post().to(notifications::notify)),
        )
        .service(
            web::scope("/messages")
                .wrap(from_fn(auth::api_key_guard))
                .route("/process", web::post().to(notifications::process_queue))
                .route("/{id}", web::get().to(notifications::get_message)),
        )
        .service(
            web::resource("/jobs/installment-reminders")
                .wrap(from_fn(auth::api_key_guard))
                .route(web::post().to(jobs::installment_reminders)),
        )
        .service(
            web::scope("/whatsapp/sessions")
                .wrap(from_fn(auth::api_key_guard))
                .route("", web::post().to(sessions::open_session))
                .route("/{name}", web::get().to(sessions::get_session))
                .route("/{name}", web::put().to(sessions::update_session)),
        )
        .service(
            web::scope("/api")
                .wrap(from_fn(auth::api_key_guard))
                .service(
                    web::scope("/customers")
                        .route("", web::get().to(customers::list_customers))
                        .route("", web::post().to(customers::create_customer))
                        .route("/{id}", web::get().to(customers::get_customer))
                        .route("/{id}", web::put().to(customers::update_customer))
                        .route("/{id}", web::delete().to(customers::delete_customer)),
                )
                .service(
                    web::scope("/orders")
                        .route("", web::get().to(orders::list_orders))
                        .route("", web::post().to(orders::create_order))
                        .route("/{id}", web::get().to(orders::get_order))
                        .route("/{id}/status", web::put().to(orders::update_order_status)),
                )
                .service(
                    web::scope("/payments")
                        .route("", web::get().to(payments::list_payments))
                        .route("", web::post().to(payments::create_payment)),
                )
                .service(
                    web::scope("/reports")
                        .route("/messages", web::get().to(reports::message_report))
                        .route("/summary", web::get().to(reports::summary_report)),
                ),
        )
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or spawning) the returned server.
pub fn build_server(
    state: AppState,
    verify_token: VerifyToken,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let verify_token = web::Data::new(verify_token);

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(verify_token.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind((host.to_string(), port))?
    .run())
}
