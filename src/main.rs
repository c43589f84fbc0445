mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use db::{DBClient, MemoryStore, Store};
use dotenv::dotenv;
use routes::create_router;
use service::{
    admin_service::AdminService,
    auth_service::{AuthService, IdentityProvider, LocalIdentityProvider, SessionRegistry},
    company_service::CompanyService,
    notification_dispatcher::NotificationDispatcher,
    notification_service::NotificationService,
    rating_service::RatingService,
    request_service::RequestService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utils::rate_limit::LoginAttemptLimiter;

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub request_service: RequestService,
    pub rating_service: RatingService,
    pub notification_service: NotificationService,
    pub admin_service: AdminService,
    pub dispatcher: NotificationDispatcher,
}

impl AppState {
    /// Wires every service onto one store. Spawns the notification worker,
    /// so it must run inside a tokio runtime.
    pub fn new(env: Config, db_client: Arc<dyn Store>) -> Self {
        let notification_service = NotificationService::new(db_client.clone());
        let dispatcher = NotificationDispatcher::spawn(
            notification_service.clone(),
            env.notification_queue_capacity,
        );

        let identity: Arc<dyn IdentityProvider> = Arc::new(LocalIdentityProvider::new(
            db_client.clone(),
            LoginAttemptLimiter::new(
                env.login_max_attempts,
                Duration::from_secs(env.login_attempt_window_secs),
            ),
        ));

        AppState {
            auth_service: AuthService::new(
                db_client.clone(),
                identity.clone(),
                SessionRegistry::new(),
                env.jwt_maxage,
            ),
            company_service: CompanyService::new(db_client.clone()),
            request_service: RequestService::new(db_client.clone(), dispatcher.clone()),
            rating_service: RatingService::new(db_client.clone()),
            admin_service: AdminService::new(db_client, identity),
            notification_service,
            dispatcher,
            env,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = Config::init();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let db_client: Arc<dyn Store> = match &config.database_url {
        Some(database_url) => {
            let pool = match PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
            {
                Ok(pool) => {
                    tracing::info!("Connection to the database is successful");
                    pool
                }
                Err(err) => {
                    tracing::error!("Failed to connect to the database: {:?}", err);
                    std::process::exit(1);
                }
            };

            let client = DBClient::new(pool);
            if let Err(err) = client.migrate().await {
                tracing::error!("Failed to run migrations: {:?}", err);
                std::process::exit(1);
            }

            Arc::new(client)
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; running on the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let allowed_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT]);

    let app_state = Arc::new(AppState::new(config.clone(), db_client));
    let dispatcher = app_state.dispatcher.clone();
    let app = create_router(app_state).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind port {}: {}", config.port, err);
            std::process::exit(1);
        }
    };

    tracing::info!("Server is running on http://localhost:{}", config.port);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", err);
    }

    // Deliver whatever notifications are still queued.
    dispatcher.flush().await;
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}
