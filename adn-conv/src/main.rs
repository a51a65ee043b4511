//! adn-conv - Sequence-to-preset conversion microservice
//!
//! Accepts batches of sequence files over HTTP, runs the conversion pipeline
//! in the background and serves the finished preset package as a ZIP.

use std::path::PathBuf;
use std::sync::Arc;

use adn_common::config::{RootFolderInitializer, RootFolderResolver};
use adn_common::events::EventBus;
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adn_conv::config::{ConfigOverrides, ServiceConfig};
use adn_conv::services::{HttpVisualAssetClient, JobOrchestrator, JobStore, MemoryJobStore};
use adn_conv::AppState;

const MODULE_NAME: &str = "adn-conv";

/// Command-line arguments for adn-conv
#[derive(Parser, Debug)]
#[command(name = "adn-conv")]
#[command(about = "Sequence-to-preset conversion microservice")]
#[command(version)]
struct Args {
    /// Address to bind
    #[arg(long, env = "ADN_CONV_BIND")]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "ADN_CONV_PORT")]
    port: Option<u16>,

    /// Root folder holding adn.db
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Pause after each pipeline stage, in milliseconds
    #[arg(long, env = "ADN_CONV_STAGE_DELAY_MS")]
    stage_delay_ms: Option<u64>,

    /// Edge length of generated 3D LUTs
    #[arg(long, env = "ADN_CONV_LUT_SIZE")]
    lut_size: Option<usize>,

    /// Preview image generation endpoint
    #[arg(long, env = "ADN_CONV_PREVIEW_ENDPOINT")]
    preview_endpoint: Option<String>,

    /// Bearer token for the preview endpoint
    #[arg(long, env = "ADN_CONV_PREVIEW_API_KEY", hide_env_values = true)]
    preview_api_key: Option<String>,

    /// Keep jobs in memory instead of SQLite
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // TOML is read before logging starts so [logging] can set the level
    let resolver = RootFolderResolver::new(MODULE_NAME).with_cli_arg(args.root_folder.clone());
    let toml_config = resolver.load_toml();
    let log_level = toml_config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("adn_conv={},tower_http=info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting adn-conv (Sequence Conversion) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Root folder: CLI → ENV → TOML → default
    let root_folder = resolver.resolve();

    let config = ServiceConfig::resolve(
        root_folder.clone(),
        toml_config.as_ref(),
        ConfigOverrides {
            bind_address: args.bind,
            port: args.port,
            stage_delay_ms: args.stage_delay_ms,
            lut_size: args.lut_size,
            preview_endpoint: args.preview_endpoint,
            preview_api_key: args.preview_api_key,
        },
    )
    .context("Invalid configuration")?;
    config.log_summary();

    let store: Arc<dyn JobStore> = if args.in_memory {
        warn!("Using in-memory job store; jobs are lost on restart");
        Arc::new(MemoryJobStore::new())
    } else {
        let initializer = RootFolderInitializer::new(root_folder);
        initializer
            .ensure_directory_exists()
            .context("Failed to initialize root folder")?;

        let db_path = initializer.database_path();
        info!("Database: {}", db_path.display());
        let pool = adn_conv::db::init_database_pool(&db_path).await?;
        info!("Database connection established");
        Arc::new(adn_conv::db::SqliteJobStore::new(pool))
    };

    let event_bus = EventBus::new(256);

    let mut orchestrator = JobOrchestrator::new(store, event_bus.clone(), config.pipeline_settings());
    if let Some(visual) = &config.visual_asset {
        let client = HttpVisualAssetClient::new(visual.endpoint.clone(), visual.api_key.clone(), visual.timeout)
            .context("Failed to create preview client")?;
        orchestrator = orchestrator.with_visual_assets(Arc::new(client));
    }

    let interrupted = orchestrator
        .recover_interrupted()
        .await
        .context("Failed to sweep interrupted jobs")?;
    if interrupted > 0 {
        warn!("Marked {} interrupted job(s) as failed", interrupted);
    }

    let app = adn_conv::build_router(AppState::new(orchestrator, event_bus));

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

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
