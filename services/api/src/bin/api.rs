//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{file_store::FileStore, pg_store::PgStore, quran_catalog::QuranCatalog},
    config::{Config, StorageBackend},
    error::ApiError,
    web::{build_router, rest::ApiDoc, state::AppState},
};
use axum::http::{header::CONTENT_TYPE, Method};
use axum::Router;
use recitation_core::{
    clock::LocalClock, planner::Planner, ports::KeyValueStore, random::ThreadRandom,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Connects the configured storage backend, running migrations where needed.
async fn connect_store(config: &Config) -> Result<Arc<dyn KeyValueStore>, ApiError> {
    match &config.storage {
        StorageBackend::File { data_dir } => {
            info!("Using file storage in {}", data_dir.display());
            let store = FileStore::new(data_dir.clone());
            store.ensure_dir().await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Postgres { database_url } => {
            info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let store = PgStore::new(pool);
            info!("Running database migrations...");
            store.run_migrations().await?;
            info!("Database migrations complete.");
            Ok(Arc::new(store))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect Storage & Restore the Planner ---
    let store = connect_store(&config).await?;
    let planner = Planner::load(
        store,
        Arc::new(QuranCatalog::new()),
        Arc::new(LocalClock),
        Box::new(ThreadRandom::new()),
        config.default_groups.clone(),
    )
    .await?;
    info!(
        "Planner ready for {} ({} chunks selected)",
        planner.today(),
        planner.state().selection.catalog.len()
    );

    // --- 3. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState::new(planner, config.clone()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .merge(build_router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
