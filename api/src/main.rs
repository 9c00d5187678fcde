use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::info;
use std::sync::Arc;
use std::time::Duration;

use cw_api::{configure_routes, AppState};
use cw_core::services::token::{SystemClock, TokenLifecycleManager, TokenServiceConfig};
use cw_shared::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    env_logger::init_from_env(
        env_logger::Env::new().default_filter_or(config.logging.level.as_str()),
    );

    info!("Starting CharityWorks API server ({})", config.environment);
    config.validate().context("invalid configuration")?;

    let infra = cw_infra::initialize(&config)
        .await
        .context("failed to initialise infrastructure")?;
    if config.database.run_migrations {
        infra
            .database
            .run_migrations()
            .await
            .context("failed to run migrations")?;
    }

    let token_config = TokenServiceConfig::from_auth_config(&config.auth)?;
    let tokens = TokenLifecycleManager::new(
        token_config,
        infra.accelerator.clone(),
        infra.store.clone(),
        Arc::new(SystemClock),
    )?;

    let state = web::Data::new(AppState::new(
        Arc::new(tokens),
        Duration::from_millis(config.server.request_timeout_ms),
    ));

    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let workers = config.server.workers;
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure_routes)
    })
    .keep_alive(Duration::from_secs(config.server.keep_alive));

    if workers > 0 {
        server = server.workers(workers);
    }

    server.bind(&bind_address)?.run().await?;

    info!("Server stopped, closing database pool");
    infra.database.close().await;
    Ok(())
}
