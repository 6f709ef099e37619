//! # Shopfloor POS HTTP API
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shopfloor API                                  │
//! │                                                                         │
//! │  Till ───► axum Router ───► routes::pos ───► shopfloor-db ───► SQLite  │
//! │               │                   │                                     │
//! │          TraceLayer               └──► shopfloor-notify (after commit)  │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                                         push gateway                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - TOML + environment configuration
//! - [`error`] - `ApiError` and its HTTP mapping
//! - [`identity`] - caller identity from trusted headers
//! - [`routes`] - `/api/pos/*` and `/health`

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use axum::Router;
use tower_http::trace::TraceLayer;

use shopfloor_db::Database;
use shopfloor_notify::LowStockDispatcher;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ErrorCode};
pub use identity::Identity;

/// Application state shared across handlers.
///
/// Both fields are cheap handles; cloning shares the pool and the sender.
#[derive(Clone)]
pub struct AppState {
    /// Database handle.
    pub db: Database,
    /// Low-stock alerts, fired after each committed sale.
    pub alerts: LowStockDispatcher,
}

impl AppState {
    pub fn new(db: Database, alerts: LowStockDispatcher) -> Self {
        AppState { db, alerts }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .nest("/api/pos", routes::pos::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
