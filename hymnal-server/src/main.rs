//! hymnal-server - catalog API and Drive streaming proxy
//!
//! Root folder resolution: `--root-folder` → `HYMNAL_ROOT_FOLDER` → TOML
//! `root_folder` → OS default. The SQLite database lives in the root folder.

use anyhow::{Context, Result};
use clap::Parser;
use hymnal_common::config::{
    default_config_path, RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use hymnal_common::db::init_database;
use hymnal_server::drive::{GoogleDrive, TokenManager};
use hymnal_server::{build_router, AppState};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MODULE_NAME: &str = "hymnal-server";

#[derive(Parser, Debug)]
#[command(name = "hymnal-server")]
#[command(about = "Music catalog API and Google Drive streaming proxy")]
#[command(version)]
struct Args {
    /// HTTP port
    #[arg(short, long, env = "HYMNAL_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "HYMNAL_BIND")]
    bind: Option<String>,

    /// Root folder holding the database
    #[arg(short, long, env = "HYMNAL_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// TOML config file (default: ~/.config/hymnal/hymnal-server.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

const DEFAULT_PORT: u16 = 5780;
const DEFAULT_BIND: &str = "127.0.0.1";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| default_config_path(MODULE_NAME));
    let config = config_path
        .as_deref()
        .map(TomlConfig::load_or_default)
        .unwrap_or_default();

    // Plain-text copy of the log when [logging] file is set
    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("hymnal_server={0},hymnal_common={0},tower_http=info", config.logging.level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    info!(
        "Starting Hymnal server (hymnal-server) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder.clone())
        .with_config_path(config_path)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("hymnal-server/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let tokens = Arc::new(TokenManager::new(pool.clone(), http.clone(), config.google.clone()));
    let drive = Arc::new(GoogleDrive::new(http, tokens));

    if config.admin_password_hash.is_none() {
        warn!("admin_password_hash not configured; admin password checks will fail");
    }

    let state = AppState::new(pool, drive).with_admin_password_hash(config.admin_password_hash.clone());
    let app = build_router(state);

    let port = args.port.or(config.port).unwrap_or(DEFAULT_PORT);
    let bind = args
        .bind
        .or(config.bind_address.clone())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    let addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("hymnal-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
