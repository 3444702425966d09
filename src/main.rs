use dotenvy::dotenv;
use notification_relay::{
    build_server, create_pool, run_migrations, spawn_workers, AppState, Config, VerifyToken,
};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url)?;
    run_migrations(&pool)?;

    let state = AppState::new(pool, &config)?;
    if config.workers_enabled {
        spawn_workers(&state, &config);
    } else {
        log::info!("Background workers disabled");
    }

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(
        state,
        VerifyToken(config.verify_token.clone()),
        &config.host,
        config.port,
    )?
    .await?;
    Ok(())
}
