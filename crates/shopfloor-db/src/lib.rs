//! # shopfloor-db: Database Layer for the Shopfloor POS
//!
//! This crate provides database access for the Shopfloor POS.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfloor Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/pos/sell)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  shopfloor-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ CheckoutRepo   │   │ 001_init.sql │   │   │
//! │  │   │ SqlitePool    │◄───│ InventoryRepo  │   │ 002_sales.sql│   │   │
//! │  │   │ WAL + busy    │    │ SaleRepo, ...  │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations and the sale transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopfloor_db::{Database, DbConfig, SaleContext};
//!
//! let db = Database::new(DbConfig::new("path/to/shopfloor.db")).await?;
//!
//! let sale = shopfloor_core::normalize_sale(&body)?;
//! let ctx = SaleContext { business_id, seller_id };
//! let done = db.checkout().complete_sale(&ctx, &sale).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::business::BusinessRepository;
pub use repository::checkout::{CheckoutRepository, CompletedSale, SaleContext};
pub use repository::customer::CustomerRepository;
pub use repository::debt::DebtRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::sale::SaleRepository;
