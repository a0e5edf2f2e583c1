//! Medfast Patient Portal - Backend Server

use std::{net::SocketAddr, time::Duration};

use sqlx::postgres::PgPoolOptions;

use medfast_backend::{
    create_app, init_tracing, scheduler,
    services::{email::mailer_from_config, MedicalTestService},
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    init_tracing(config.logging.format);

    tracing::info!("Starting Medfast Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    if config.database.run_migrations {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    let mailer = mailer_from_config(&config.mail)?;
    if !config.mail.enabled {
        tracing::warn!("Mail delivery disabled, outgoing messages are only logged");
    }

    if config.scheduler.enabled {
        scheduler::spawn(MedicalTestService::new(db_pool.clone()), &config.scheduler);
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    // Create application state
    let state = AppState::new(db_pool, config, mailer)?;

    // Build application
    let app = create_app(state);

    // Start server
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
