//! # Repository Module
//!
//! Database repository implementations for the Shopfloor POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.checkout().complete_sale(&ctx, &sale)                      │
//! │       ▼                                                                 │
//! │  CheckoutRepository ──► inventory::take_store_stock(tx, ..)            │
//! │                     ──► inventory::take_warehouse_stock(tx, ..)        │
//! │                     ──► debt::merge_open_debt(tx, ..)                  │
//! │       │                                                                 │
//! │       │  one SQLite transaction                                        │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories own a pool handle for standalone reads and writes.
//! Steps that must share the sale transaction are crate-private free
//! functions taking `&mut Transaction<'_, Sqlite>`.
//!
//! ## Available Repositories
//!
//! - [`BusinessRepository`](business::BusinessRepository) - Tenants, users, locations, push tokens
//! - [`InventoryRepository`](inventory::InventoryRepository) - Store and warehouse goods
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers and the picker search
//! - [`DebtRepository`](debt::DebtRepository) - Open debt reads
//! - [`SaleRepository`](sale::SaleRepository) - Receipts and the sales list
//! - [`CheckoutRepository`](checkout::CheckoutRepository) - The sale transaction

pub mod business;
pub mod checkout;
pub mod customer;
pub mod debt;
pub mod inventory;
pub mod sale;

/// Escapes `%`, `_` and the escape character itself for a
/// `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// `%term%` with wildcards in `term` taken literally.
pub(crate) fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}
