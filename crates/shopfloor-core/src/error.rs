//! # Error Types
//!
//! Domain-specific error types for shopfloor-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError          input is malformed (never touches storage)   │
//! │       │                                                                 │
//! │       │ #[from]                                                         │
//! │       ▼                                                                 │
//! │  CoreError                referenced entity missing, stock too low     │
//! │       │                                                                 │
//! │       │ #[from] (shopfloor-db)                                          │
//! │       ▼                                                                 │
//! │  DbError ──► ApiError     400 / 404 / 409 / 500                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Messages name the offending field or item position ("Store item 2: quantity")
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::types::StockPool;

// =============================================================================
// Core Error
// =============================================================================

/// Core business rule errors.
///
/// Raised by the sale transaction engine while it re-checks the cart
/// against live data. Any of these aborts the whole transaction.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Store is missing or belongs to another business.
    #[error("Store not found: {0}")]
    StoreNotFound(i64),

    /// Customer is missing or belongs to another business.
    #[error("Customer not found: {0}")]
    CustomerNotFound(i64),

    /// Store product is missing or belongs to another business.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Warehouse product is missing or belongs to another business.
    #[error("Warehouse product not found: {0}")]
    WarehouseProductNotFound(i64),

    /// Insufficient stock to complete sale.
    ///
    /// ## When This Occurs
    /// - A line asks for more units than the live row holds
    /// - A concurrent sale drained the row between check and decrement
    ///
    /// ## User Workflow
    /// ```text
    /// Store item: Sugar 1kg × 5
    ///      │
    ///      ▼
    /// Live stock: 3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Sugar 1kg", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// 400 { "error": "...", "available": 3 }
    /// ```
    #[error(
        "Insufficient {}stock for {product}: available {available}, requested {requested}",
        .pool.qualifier()
    )]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
        pool: StockPool,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Produced by the cart normalizer before any database work happens.
/// `field` carries the positional label for array items, e.g.
/// `"Warehouse item 1: price"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Body is not a JSON object.
    #[error("Request body must be a JSON object")]
    NotAnObject,

    /// Value does not parse to a finite integer.
    #[error("{field} must be a whole number")]
    NotWholeNumber { field: String },

    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// An identifier is out of range (e.g. `storeId <= 0`).
    #[error("Invalid {field}")]
    InvalidId { field: String },

    /// Quantity or price of a line is not strictly positive.
    #[error("{line}: Invalid quantity or price")]
    InvalidLine { line: String },

    /// All three item groups are empty.
    #[error("No items to sell")]
    EmptyCart,

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Value exceeds an upper bound named by `limit`.
    #[error("{field} cannot exceed {limit}")]
    Exceeds { field: String, limit: String },

    /// Computed sum does not fit in an i64.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Positive balance without a customer to carry the debt.
    #[error("Customer required for part payment")]
    CustomerRequiredForBalance,

    /// Legacy credit sale without a customer.
    #[error("Customer ID required for credit sales")]
    CustomerRequiredForCredit,

    /// Legacy payload with non-positive quantity or price.
    #[error("Invalid sale data")]
    InvalidSaleData,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for Results with ValidationError.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
