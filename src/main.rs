use axum::{Json, Router, http::header, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use timebank::{
    api::{
        handlers::{AppState, api_routes},
        openapi::ApiDoc,
    },
    auth::jwt::JwtService,
    config::CONFIG,
    core::services::LedgerService,
    infrastructure::{
        directory::in_memory::InMemoryDirectory, logging::in_memory::InMemoryLogging,
        storage::in_memory::InMemoryStorage,
    },
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&CONFIG.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("Loaded configuration: {:?}", *CONFIG);
    let settings = CONFIG.ledger_settings().inspect_err(|e| error!("Invalid ledger configuration: {}", e))?;

    let ledger = LedgerService::new(
        InMemoryStorage::new(),
        InMemoryDirectory::new(),
        InMemoryLogging::new(),
        settings,
    );
    let state = AppState {
        ledger: Arc::new(ledger),
        jwt: Arc::new(JwtService::new(CONFIG.jwt_secret.clone())),
    };

    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api", api_routes(state))
        .layer(CompressionLayer::new()) // Gzip compression
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], CONFIG.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
