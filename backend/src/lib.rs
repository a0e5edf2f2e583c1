//! Medfast Patient Portal - Backend
//!
//! Patient sign-up with e-mail verification, JWT sessions, password recovery,
//! consultation appointments and medical tests with generated PDF results.

use std::{sync::Arc, time::Duration};

use axum::{routing::get, Router};
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pdf;
pub mod routes;
pub mod scheduler;
pub mod services;

pub use config::Config;

use config::LogFormat;
use error::AppResult;
use services::{
    AuthService, EmailService, JwtService, Mailer, OtpService, PasswordService, TokenBlacklist,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub jwt: JwtService,
    pub blacklist: TokenBlacklist,
    pub email: EmailService,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> AppResult<Self> {
        let jwt = JwtService::new(&config.token)?;
        let ttl = Duration::from_secs(config.token.access_timeout.max(0) as u64);
        let email = EmailService::new(mailer, &config);

        Ok(Self {
            db,
            jwt,
            blacklist: TokenBlacklist::new(ttl),
            email,
            config: Arc::new(config),
        })
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.db.clone(),
            &self.config,
            self.jwt.clone(),
            self.blacklist.clone(),
            self.email.clone(),
        )
    }

    pub fn otp_service(&self) -> OtpService {
        OtpService::new(self.db.clone(), &self.config, self.email.clone())
    }

    pub fn password_service(&self) -> PasswordService {
        PasswordService::new(self.db.clone(), &self.config, self.email.clone())
    }
}

/// Install the global subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "medfast_server=debug,medfast_backend=debug,tower_http=debug,sqlx=warn".into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .merge(routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
