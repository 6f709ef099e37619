//! # Domain Types
//!
//! Core domain types used throughout the Shopfloor POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Business (tenant)                              │
//! │        ┌───────────────┬──────────┴──────┬──────────────┐              │
//! │        ▼               ▼                 ▼              ▼              │
//! │     Store          Warehouse          Customer         User            │
//! │        │               │                 │              │              │
//! │        ▼               ▼                 ▼              ▼              │
//! │  StoreProduct   WarehouseProduct       Debt        PushToken           │
//! │        │               │          (≤ 1 open)                           │
//! │        └──────┬────────┘                                               │
//! │               ▼                                                         │
//! │   Sale ──► SaleItem { source: store | warehouse | outside }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Integer Identity
//! Every entity uses an `INTEGER PRIMARY KEY`. Clients send ids as JSON
//! numbers, and receipts print sale ids directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Stock Pool
// =============================================================================

/// The two independently tracked inventory pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StockPool {
    /// Stock owned by a store.
    Store,
    /// Stock owned by a warehouse.
    Warehouse,
}

impl StockPool {
    /// Word inserted before "stock" in user-facing messages.
    pub const fn qualifier(&self) -> &'static str {
        match self {
            StockPool::Store => "",
            StockPool::Warehouse => "warehouse ",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            StockPool::Store => "store",
            StockPool::Warehouse => "warehouse",
        }
    }
}

impl std::fmt::Display for StockPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Line Source
// =============================================================================

/// Where a sale line's goods came from. Stored in `sale_items.source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum LineSource {
    Store,
    Warehouse,
    Outside,
}

/// Product reference carried by a sale line.
///
/// ## Storage Mapping
/// ```text
/// ProductRef::Store(7)      → source='store',     store_product_id=7,    warehouse_product_id=NULL
/// ProductRef::Warehouse(3)  → source='warehouse', store_product_id=NULL, warehouse_product_id=3
/// ProductRef::Outside       → source='outside',   store_product_id=NULL, warehouse_product_id=NULL
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductRef {
    Store(i64),
    Warehouse(i64),
    Outside,
}

impl ProductRef {
    pub const fn source(&self) -> LineSource {
        match self {
            ProductRef::Store(_) => LineSource::Store,
            ProductRef::Warehouse(_) => LineSource::Warehouse,
            ProductRef::Outside => LineSource::Outside,
        }
    }

    pub const fn store_product_id(&self) -> Option<i64> {
        match self {
            ProductRef::Store(id) => Some(*id),
            _ => None,
        }
    }

    pub const fn warehouse_product_id(&self) -> Option<i64> {
        match self {
            ProductRef::Warehouse(id) => Some(*id),
            _ => None,
        }
    }
}

// =============================================================================
// User Role
// =============================================================================

/// Role of a user within their business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Business owner. Receives low-stock alerts.
    Superadmin,
    Admin,
    Cashier,
}

// =============================================================================
// Directory Rows
// =============================================================================

/// A tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Business {
    pub id: i64,
    pub name: String,
}

/// A user who can sell. `business_id` is `None` until the user joins one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub business_id: Option<i64>,
    pub full_name: String,
    pub role: UserRole,
}

/// A selling location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Store {
    pub id: i64,
    pub business_id: i64,
    pub name: String,
}

/// A stock-holding location that is not a till.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Warehouse {
    pub id: i64,
    pub business_id: i64,
    pub name: String,
}

/// Who receives a business's low-stock alerts, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AlertRecipient {
    pub user_id: i64,
    pub full_name: String,
    /// Registered push token; `None` when the user never registered a device.
    pub token: Option<String>,
}

// =============================================================================
// Products
// =============================================================================

/// Goods held by a store.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreProduct {
    pub id: i64,
    pub store_id: i64,
    /// Unique within its store.
    pub name: String,
    /// Never negative (CHECK constraint).
    pub quantity: i64,
    pub price: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StoreProduct {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_units(self.price)
    }
}

/// Goods held by a warehouse.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseProduct {
    pub id: i64,
    pub warehouse_id: i64,
    pub name: String,
    pub quantity: i64,
    pub selling_price: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl WarehouseProduct {
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_units(self.selling_price)
    }
}

/// Remaining quantity of a product right after a sale decremented it.
///
/// The engine collects one of these per stock-backed line; the HTTP layer
/// hands them to the low-stock dispatcher after commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub pool: StockPool,
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
}

impl StockLevel {
    /// True when the remaining quantity is at or below `threshold`.
    #[inline]
    pub fn is_low(&self, threshold: i64) -> bool {
        self.quantity <= threshold
    }
}

// =============================================================================
// Customers & Debt
// =============================================================================

/// A named buyer who can carry a debt.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub business_id: i64,
    pub full_name: String,
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A customer's accrued debt.
///
/// ## Invariant
/// At most one row per (customer, business) has `is_cleared = false`.
/// New part-payment balances are merged into that row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: i64,
    pub customer_id: i64,
    pub business_id: i64,
    /// Lifetime accrued amount.
    pub total_amount: i64,
    pub amount_paid: i64,
    /// Outstanding amount.
    pub balance: i64,
    pub is_cleared: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Debt {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_units(self.balance)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    pub store_id: i64,
    pub sold_by_id: i64,
    pub customer_id: Option<i64>,
    /// Free-text name typed at the till; may exist without `customer_id`.
    pub customer_name: Option<String>,
    pub total: i64,
    pub amount_paid: i64,
    /// Always `total - amount_paid`.
    pub balance: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_units(self.total)
    }

    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_units(self.amount_paid)
    }

    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_units(self.balance)
    }
}

/// One line of a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub source: LineSource,
    pub store_product_id: Option<i64>,
    pub warehouse_product_id: Option<i64>,
    /// Product name as it was when sold.
    pub name: String,
    pub quantity: i64,
    /// Unit price.
    pub price: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// quantity × price (derived, not stored).
    #[inline]
    pub fn subtotal(&self) -> i64 {
        self.quantity * self.price
    }

    /// Rebuilds the tagged reference from the nullable columns.
    pub fn product_ref(&self) -> ProductRef {
        match (self.source, self.store_product_id, self.warehouse_product_id) {
            (LineSource::Store, Some(id), _) => ProductRef::Store(id),
            (LineSource::Warehouse, _, Some(id)) => ProductRef::Warehouse(id),
            // A deleted product nulls its reference; the line keeps its name.
            _ => ProductRef::Outside,
        }
    }
}

// =============================================================================
// Read Models
// =============================================================================

/// Store goods row returned by the POS search.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreGood {
    pub store_product_id: i64,
    pub name: String,
    pub store_name: String,
    pub price: i64,
    pub quantity: i64,
}

/// Warehouse goods row returned by the POS search.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseGood {
    pub warehouse_product_id: i64,
    pub name: String,
    pub warehouse_name: String,
    pub price: i64,
    pub quantity: i64,
}

/// Customer row returned by the POS customer picker.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerMatch {
    pub id: i64,
    pub full_name: String,
    pub phone: Option<String>,
    /// Sum of open debt balances.
    pub total_debt: i64,
}

/// Sales list row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummary {
    pub id: i64,
    pub store_id: i64,
    pub store_name: String,
    pub sold_by_id: i64,
    pub sold_by_name: String,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    /// Linked customer's registered name, if any.
    pub customer_full_name: Option<String>,
    pub total: i64,
    pub amount_paid: i64,
    pub balance: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Printable receipt line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    pub source: LineSource,
    pub quantity: i64,
    pub price: i64,
    pub subtotal: i64,
}

/// Printable receipt with the customer's debt position.
///
/// ## Debt Context
/// ```text
/// totalDebt    = customer's open debt balance now (includes this sale)
/// previousDebt = max(0, totalDebt - balance)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: i64,
    pub store: String,
    pub sold_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub items: Vec<ReceiptLine>,
    pub total: i64,
    pub amount_paid: i64,
    pub balance: i64,
    pub previous_debt: i64,
    pub total_debt: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_ref_columns() {
        let r = ProductRef::Store(7);
        assert_eq!(r.source(), LineSource::Store);
        assert_eq!(r.store_product_id(), Some(7));
        assert_eq!(r.warehouse_product_id(), None);

        let r = ProductRef::Warehouse(3);
        assert_eq!(r.source(), LineSource::Warehouse);
        assert_eq!(r.store_product_id(), None);
        assert_eq!(r.warehouse_product_id(), Some(3));

        let r = ProductRef::Outside;
        assert_eq!(r.source(), LineSource::Outside);
        assert_eq!(r.store_product_id(), None);
        assert_eq!(r.warehouse_product_id(), None);
    }

    #[test]
    fn test_sale_item_subtotal_and_ref() {
        let item = SaleItem {
            id: 1,
            sale_id: 1,
            source: LineSource::Warehouse,
            store_product_id: None,
            warehouse_product_id: Some(4),
            name: "Rice 50kg".to_string(),
            quantity: 3,
            price: 250,
            created_at: Utc::now(),
        };
        assert_eq!(item.subtotal(), 750);
        assert_eq!(item.product_ref(), ProductRef::Warehouse(4));
    }

    #[test]
    fn test_stock_level_threshold_is_inclusive() {
        let level = StockLevel {
            pool: StockPool::Store,
            product_id: 5,
            name: "Sugar".to_string(),
            quantity: 2,
        };
        assert!(level.is_low(2));
        assert!(!StockLevel { quantity: 3, ..level }.is_low(2));
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&LineSource::Outside).unwrap(), "\"outside\"");
        assert_eq!(serde_json::to_string(&StockPool::Warehouse).unwrap(), "\"warehouse\"");
        assert_eq!(serde_json::to_string(&UserRole::Superadmin).unwrap(), "\"SUPERADMIN\"");
    }
}
