//! cinelog-web - movie collection service
//!
//! Serves the JSON API for browsing and maintaining the movie catalog and
//! for adding movies by title or from a photo.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinelog_common::config::load_toml_config;
use cinelog_web::config::{CliOverrides, ServiceConfig};
use cinelog_web::services::{
    Catalog, CatalogSync, DisabledExtractor, DriveSync, GeminiClient, NoSync, TitleExtractor,
    TmdbClient, TsvCatalogStore,
};
use cinelog_web::{build_router, AppState};

/// Command-line arguments for cinelog-web
#[derive(Parser, Debug)]
#[command(name = "cinelog-web")]
#[command(about = "Personal movie collection service")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "CINELOG_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "CINELOG_PORT")]
    port: Option<u16>,

    /// Interface to bind
    #[arg(short, long, env = "CINELOG_BIND_ADDRESS")]
    bind: Option<String>,

    /// Folder holding the catalog and the session database
    #[arg(short, long, env = "CINELOG_DATA_FOLDER")]
    data_folder: Option<PathBuf>,

    /// Catalog file (relative paths resolve inside the data folder)
    #[arg(long, env = "CINELOG_CATALOG")]
    catalog: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = load_toml_config(args.config.as_deref());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                let level = &toml_config.logging.level;
                format!("cinelog_web={},tower_http={}", level, level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = CliOverrides {
        bind_address: args.bind,
        port: args.port,
        data_folder: args.data_folder,
        catalog_file: args.catalog,
    };
    let config = ServiceConfig::resolve(&cli, &toml_config).context("Invalid configuration")?;

    info!("Starting cinelog-web v{}", env!("CARGO_PKG_VERSION"));
    info!("Data folder: {}", config.data_folder.display());
    info!("Catalog: {}", config.catalog_path.display());

    let db_pool = cinelog_web::db::init_database_pool(&config.database_path)
        .await
        .context("Failed to open session database")?;
    info!("Database: {}", config.database_path.display());

    let sync: Arc<dyn CatalogSync> = match &config.drive {
        Some(drive) => Arc::new(
            DriveSync::new(drive.file_id.clone(), drive.access_token.clone())
                .context("Failed to create Drive client")?,
        ),
        None => Arc::new(NoSync),
    };
    let catalog = Catalog::new(Arc::new(TsvCatalogStore::new(
        config.catalog_path.clone(),
        sync,
    )));

    let metadata = Arc::new(
        TmdbClient::new(config.tmdb_api_key.clone()).context("Failed to create TMDb client")?,
    );

    let extractor: Arc<dyn TitleExtractor> = match &config.gemini_api_key {
        Some(key) => Arc::new(
            GeminiClient::new(key.clone(), config.gemini_models.clone())
                .context("Failed to create Gemini client")?,
        ),
        None => Arc::new(DisabledExtractor),
    };

    let state = AppState::new(
        db_pool,
        catalog,
        metadata,
        extractor,
        config.site_password.as_str(),
    );
    let app = build_router(state);

    let address = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;
    info!("Listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
