//! RMS Backend - Refugee Management System
//!
//! Main entry point for the camp assignment server.

use std::sync::Arc;
use std::time::Duration;

use rms_server::{
    assignment_engine::AssignmentEngine,
    camp_graph::CampGraphService,
    camp_registry::{CampRegistryService, CampRepository, MySqlCampRepository},
    geocoder::GeocoderClient,
    refugee_registry::{MySqlRefugeeRepository, RefugeeRegistryService, RefugeeRepository},
    state::{AppConfig, AppState},
    web_api,
};
use sqlx::mysql::MySqlPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rms_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RMS backend v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        database_url = %config.database_url,
        nominatim_url = %config.nominatim_url,
        "Configuration loaded"
    );

    // Create database pool
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await?;

    tracing::info!("Database connected");

    // Repositories
    let camp_repo: Arc<dyn CampRepository> = Arc::new(MySqlCampRepository::new(pool.clone()));
    let refugee_repo: Arc<dyn RefugeeRepository> =
        Arc::new(MySqlRefugeeRepository::new(pool.clone()));

    // Services
    let camps = Arc::new(CampRegistryService::new(
        camp_repo.clone(),
        refugee_repo.clone(),
    ));
    let refugees = Arc::new(RefugeeRegistryService::new(refugee_repo.clone()));
    let assignment = Arc::new(AssignmentEngine::new(
        camp_repo.clone(),
        refugee_repo.clone(),
    ));
    let camp_graph = Arc::new(CampGraphService::new(camp_repo.clone()));
    let geocoder = Arc::new(GeocoderClient::new(config.nominatim_url.clone()));
    tracing::info!("Services initialized");

    // Create application state
    let state = AppState {
        pool,
        config,
        camps,
        refugees,
        assignment,
        camp_graph,
        geocoder,
    };

    // Create router
    let app = web_api::create_router(state.clone())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
