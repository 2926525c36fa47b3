use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_api_rest::{AppState, router};
use catalog_core::CoreConfig;

/// Main entry point for the catalog server
///
/// Resolves configuration once, then serves the REST API until Ctrl-C.
///
/// # Environment Variables
/// - `CATALOG_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CATALOG_DATA_DIR`: Directory for product records (default: "catalog_data")
/// - `CATALOG_UPLOAD_DIR`: Directory for uploaded images (default: "uploads")
/// - `CATALOG_MAX_FILE_SIZE`: Per-file upload cap in bytes (default: 1048576)
/// - `CATALOG_MAX_FILES`: Files accepted by multi-image routes (default: 4)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a setting is malformed or a storage directory cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("catalog=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CATALOG_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(CoreConfig::from_env_values(
        std::env::var("CATALOG_DATA_DIR").ok(),
        std::env::var("CATALOG_UPLOAD_DIR").ok(),
        std::env::var("CATALOG_MAX_FILE_SIZE").ok(),
        std::env::var("CATALOG_MAX_FILES").ok(),
    )?);

    tracing::info!(
        data_dir = %cfg.data_dir().display(),
        upload_dir = %cfg.upload_dir().display(),
        max_file_size = cfg.max_file_size(),
        max_files = cfg.max_files(),
        "++ Catalog configuration resolved"
    );

    let app = router(AppState::new(cfg)?);

    tracing::info!("++ Starting catalog REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Catalog REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}
