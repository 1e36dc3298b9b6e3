//! Personal notes API server
//!
//! Serves registration, login, and owner-scoped note CRUD over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notes_service::config::Config;
use notes_service::storage::JsonStore;
use notes_service::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "notes-service")]
#[command(about = "Personal notes API with password login")]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 5000, env = "NOTES_PORT")]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "NOTES_BIND")]
    bind: String,

    /// Directory holding config.json and the record tables
    #[arg(long, default_value = "./data", env = "NOTES_DATA_PATH")]
    data_path: String,

    /// Token signing secret, hex-encoded (overrides config.json)
    #[arg(long, env = "NOTES_SIGNING_SECRET", hide_env_values = true)]
    signing_secret: Option<String>,

    /// Keep records in memory only
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notes_service=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.data_path)?;
    let signing_key = config.signing_key(cli.signing_secret.as_deref())?;

    let store = if cli.in_memory {
        tracing::info!("Using in-memory record store");
        JsonStore::in_memory()
    } else {
        JsonStore::open(&cli.data_path)
            .with_context(|| format!("Failed to open record store at {}", cli.data_path))?
    };

    let state = Arc::new(AppState::new(&config, &signing_key, Arc::new(store))?);
    let app = router(state);

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;

    tracing::info!("Starting notes-service on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Notes service shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
