//! # shopfloor-core: Pure Business Logic for the Shopfloor POS
//!
//! This crate holds the rules of a sale as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfloor Sale Flow                              │
//! │                                                                         │
//! │  POST /api/pos/sell (shopfloor-api)                                    │
//! │       │ raw JSON                                                        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 shopfloor-core (THIS CRATE)                     │   │
//! │  │   cart::normalize_sale ──► NormalizedSale | ValidationError     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  shopfloor-db: CheckoutRepository::complete_sale (one transaction)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  shopfloor-notify: LowStockDispatcher (after commit, not awaited)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`cart`] - Cart normalizer (legacy and multi-source payloads)
//! - [`types`] - Domain types (StoreProduct, Sale, SaleItem, Debt, etc.)
//! - [`money`] - Money type with checked integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Field coercion helpers
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output
//! 2. **No I/O**: database and network access live in other crates
//! 3. **Integer Money**: amounts are whole currency units (i64), sums are checked
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{normalize_sale, NormalizedSale, SaleOrigin};
pub use error::{CoreError, CoreResult, ValidationError, ValidationResult};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Remaining quantity at or below which a low-stock alert is sent.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 2;

/// Maximum rows returned by the goods searches.
pub const GOODS_SEARCH_LIMIT: i64 = 20;

/// Maximum rows returned by the customer picker.
pub const CUSTOMER_SEARCH_LIMIT: i64 = 10;
