//! # Shopfloor POS API Server
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Initialize Logging ─────────────────────────────────────────────►  │
//! │     • tracing-subscriber with env filter                                │
//! │     • Default: info, shopfloor=debug; RUST_LOG overrides               │
//! │                                                                         │
//! │  2. Load Configuration ─────────────────────────────────────────────►  │
//! │     • api.toml (optional) + SHOPFLOOR_* environment                    │
//! │                                                                         │
//! │  3. Open Database ──────────────────────────────────────────────────►  │
//! │     • WAL, foreign keys, busy timeout, embedded migrations             │
//! │                                                                         │
//! │  4. Build Alert Dispatcher ─────────────────────────────────────────►  │
//! │     • HTTP push sender, or log-only when disabled                      │
//! │                                                                         │
//! │  5. Serve until Ctrl+C / SIGTERM ───────────────────────────────────►  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopfloor_api::{create_router, ApiConfig, AppState};
use shopfloor_db::Database;
use shopfloor_notify::{sender_from_config, LowStockDispatcher};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Shopfloor POS API");

    let config = ApiConfig::load(None)?;
    info!(
        addr = %config.server.bind_address(),
        db = %config.database.path.display(),
        push_enabled = config.notifications.enabled,
        low_stock_threshold = config.notifications.low_stock_threshold,
        "Configuration loaded"
    );

    let db = Database::new(config.database.db_config()).await?;

    let sender = sender_from_config(&config.notifications)?;
    let alerts = LowStockDispatcher::new(
        db.clone(),
        sender,
        config.notifications.low_stock_threshold,
    );

    let app = create_router(AppState::new(db.clone(), alerts));

    let listener = TcpListener::bind(config.server.bind_address()).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server stopped");

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=shopfloor_db=trace` - Trace one crate
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shopfloor=debug,sqlx=warn,tower_http=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
