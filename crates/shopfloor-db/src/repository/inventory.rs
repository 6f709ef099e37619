//! # Inventory Repository
//!
//! Store and warehouse goods: lookup, the POS searches, and the stock
//! decrement used by the sale transaction.
//!
//! ## Two Pools, One Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Decrement Strategy                             │
//! │                                                                         │
//! │  ❌ WRONG: read, subtract in Rust, write the result                    │
//! │     UPDATE store_products SET quantity = 7 WHERE id = ?                 │
//! │                                                                         │
//! │  ✅ CORRECT: conditional delta                                          │
//! │     UPDATE store_products SET quantity = quantity - 3                   │
//! │     WHERE id = ? AND quantity >= 3                                      │
//! │     RETURNING quantity                                                  │
//! │                                                                         │
//! │  Zero rows back → someone else took the stock → InsufficientStock       │
//! │  CHECK (quantity >= 0) backs this up at the schema level                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store and warehouse products live in separate tables and are never
//! mixed; each has its own `take_*_stock` function.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::contains_pattern;
use shopfloor_core::cart::{StoreLine, WarehouseLine};
use shopfloor_core::{
    CoreError, StockLevel, StockPool, StoreGood, StoreProduct, WarehouseGood, WarehouseProduct,
};

const STORE_PRODUCT_IN_BUSINESS: &str = r#"
    SELECT
        sp.id,
        sp.store_id,
        sp.name,
        sp.quantity,
        sp.price,
        sp.created_at,
        sp.updated_at
    FROM store_products sp
    INNER JOIN stores s ON s.id = sp.store_id
    WHERE sp.id = ?1 AND s.business_id = ?2
"#;

const WAREHOUSE_PRODUCT_IN_BUSINESS: &str = r#"
    SELECT
        wp.id,
        wp.warehouse_id,
        wp.name,
        wp.quantity,
        wp.selling_price,
        wp.created_at,
        wp.updated_at
    FROM warehouse_products wp
    INNER JOIN warehouses w ON w.id = wp.warehouse_id
    WHERE wp.id = ?1 AND w.business_id = ?2
"#;

/// Repository for store and warehouse goods.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.inventory();
///
/// // POS search box
/// let goods = repo.search_store_goods(business_id, "sugar", 20).await?;
///
/// // Single product, scoped to the caller's business
/// let product = repo.get_store_product(business_id, 5).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Adds a product to a store.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - the store already has a product with this name
    pub async fn add_store_product(
        &self,
        store_id: i64,
        name: &str,
        quantity: i64,
        price: i64,
    ) -> DbResult<StoreProduct> {
        debug!(store_id = %store_id, name = %name, quantity = %quantity, "Adding store product");

        let now = Utc::now();
        let product = sqlx::query_as::<_, StoreProduct>(
            r#"
            INSERT INTO store_products (store_id, name, quantity, price, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING id, store_id, name, quantity, price, created_at, updated_at
            "#,
        )
        .bind(store_id)
        .bind(name)
        .bind(quantity)
        .bind(price)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    /// Adds a product to a warehouse.
    pub async fn add_warehouse_product(
        &self,
        warehouse_id: i64,
        name: &str,
        quantity: i64,
        selling_price: i64,
    ) -> DbResult<WarehouseProduct> {
        debug!(warehouse_id = %warehouse_id, name = %name, quantity = %quantity, "Adding warehouse product");

        let now = Utc::now();
        let product = sqlx::query_as::<_, WarehouseProduct>(
            r#"
            INSERT INTO warehouse_products (warehouse_id, name, quantity, selling_price, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING id, warehouse_id, name, quantity, selling_price, created_at, updated_at
            "#,
        )
        .bind(warehouse_id)
        .bind(name)
        .bind(quantity)
        .bind(selling_price)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a store product, but only if its store belongs to `business_id`.
    pub async fn get_store_product(
        &self,
        business_id: i64,
        id: i64,
    ) -> DbResult<Option<StoreProduct>> {
        let product = sqlx::query_as::<_, StoreProduct>(STORE_PRODUCT_IN_BUSINESS)
            .bind(id)
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a warehouse product, but only if its warehouse belongs to `business_id`.
    pub async fn get_warehouse_product(
        &self,
        business_id: i64,
        id: i64,
    ) -> DbResult<Option<WarehouseProduct>> {
        let product = sqlx::query_as::<_, WarehouseProduct>(WAREHOUSE_PRODUCT_IN_BUSINESS)
            .bind(id)
            .bind(business_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Searches in-stock store goods of a business by name.
    ///
    /// ## How It Works
    /// 1. Case-insensitive substring match (`LIKE`, wildcards in the query escaped)
    /// 2. Only rows with `quantity > 0`
    /// 3. Ordered by name, at most `limit` rows
    ///
    /// SQLite's `LIKE` folds ASCII letters only: "sugar" finds "Sugar", but
    /// "épices" does not find "Épices".
    pub async fn search_store_goods(
        &self,
        business_id: i64,
        query: &str,
        limit: i64,
    ) -> DbResult<Vec<StoreGood>> {
        debug!(business_id = %business_id, query = %query, limit = %limit, "Searching store goods");

        let goods = sqlx::query_as::<_, StoreGood>(
            r#"
            SELECT
                sp.id AS store_product_id,
                sp.name,
                s.name AS store_name,
                sp.price,
                sp.quantity
            FROM store_products sp
            INNER JOIN stores s ON s.id = sp.store_id
            WHERE s.business_id = ?1
              AND sp.quantity > 0
              AND sp.name LIKE ?2 ESCAPE '\'
            ORDER BY sp.name, sp.id
            LIMIT ?3
            "#,
        )
        .bind(business_id)
        .bind(contains_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = goods.len(), "Store search returned goods");
        Ok(goods)
    }

    /// Searches in-stock warehouse goods of a business by name.
    ///
    /// Same matching rules as [`search_store_goods`](Self::search_store_goods),
    /// including ASCII-only case folding.
    pub async fn search_warehouse_goods(
        &self,
        business_id: i64,
        query: &str,
        limit: i64,
    ) -> DbResult<Vec<WarehouseGood>> {
        debug!(business_id = %business_id, query = %query, limit = %limit, "Searching warehouse goods");

        let goods = sqlx::query_as::<_, WarehouseGood>(
            r#"
            SELECT
                wp.id AS warehouse_product_id,
                wp.name,
                w.name AS warehouse_name,
                wp.selling_price AS price,
                wp.quantity
            FROM warehouse_products wp
            INNER JOIN warehouses w ON w.id = wp.warehouse_id
            WHERE w.business_id = ?1
              AND wp.quantity > 0
              AND wp.name LIKE ?2 ESCAPE '\'
            ORDER BY wp.name, wp.id
            LIMIT ?3
            "#,
        )
        .bind(business_id)
        .bind(contains_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = goods.len(), "Warehouse search returned goods");
        Ok(goods)
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Takes `line.quantity` units of a store product inside the sale
/// transaction and returns what is left.
///
/// ## Errors
/// * `CoreError::ProductNotFound` - missing, or in another business
/// * `CoreError::InsufficientStock` - live quantity below the request
pub(crate) async fn take_store_stock(
    tx: &mut Transaction<'_, Sqlite>,
    business_id: i64,
    line: &StoreLine,
) -> DbResult<StockLevel> {
    let product = sqlx::query_as::<_, StoreProduct>(STORE_PRODUCT_IN_BUSINESS)
        .bind(line.store_product_id)
        .bind(business_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(CoreError::ProductNotFound(line.store_product_id))?;

    if product.quantity < line.quantity {
        return Err(insufficient(&product.name, product.quantity, line.quantity, StockPool::Store));
    }

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE store_products
        SET quantity = quantity - ?2,
            updated_at = ?3
        WHERE id = ?1 AND quantity >= ?2
        RETURNING quantity
        "#,
    )
    .bind(product.id)
    .bind(line.quantity)
    .bind(Utc::now())
    .fetch_optional(&mut **tx)
    .await?;

    let quantity = match remaining {
        Some(quantity) => quantity,
        None => {
            let available: i64 =
                sqlx::query_scalar("SELECT quantity FROM store_products WHERE id = ?1")
                    .bind(product.id)
                    .fetch_one(&mut **tx)
                    .await?;
            return Err(insufficient(&product.name, available, line.quantity, StockPool::Store));
        }
    };

    debug!(product_id = %product.id, sold = %line.quantity, remaining = %quantity, "Store stock taken");

    Ok(StockLevel {
        pool: StockPool::Store,
        product_id: product.id,
        name: product.name,
        quantity,
    })
}

/// Warehouse counterpart of [`take_store_stock`].
///
/// ## Errors
/// * `CoreError::WarehouseProductNotFound` - missing, or in another business
/// * `CoreError::InsufficientStock` - live quantity below the request
pub(crate) async fn take_warehouse_stock(
    tx: &mut Transaction<'_, Sqlite>,
    business_id: i64,
    line: &WarehouseLine,
) -> DbResult<StockLevel> {
    let product = sqlx::query_as::<_, WarehouseProduct>(WAREHOUSE_PRODUCT_IN_BUSINESS)
        .bind(line.warehouse_product_id)
        .bind(business_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(CoreError::WarehouseProductNotFound(line.warehouse_product_id))?;

    if product.quantity < line.quantity {
        return Err(insufficient(&product.name, product.quantity, line.quantity, StockPool::Warehouse));
    }

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE warehouse_products
        SET quantity = quantity - ?2,
            updated_at = ?3
        WHERE id = ?1 AND quantity >= ?2
        RETURNING quantity
        "#,
    )
    .bind(product.id)
    .bind(line.quantity)
    .bind(Utc::now())
    .fetch_optional(&mut **tx)
    .await?;

    let quantity = match remaining {
        Some(quantity) => quantity,
        None => {
            let available: i64 =
                sqlx::query_scalar("SELECT quantity FROM warehouse_products WHERE id = ?1")
                    .bind(product.id)
                    .fetch_one(&mut **tx)
                    .await?;
            return Err(insufficient(&product.name, available, line.quantity, StockPool::Warehouse));
        }
    };

    debug!(product_id = %product.id, sold = %line.quantity, remaining = %quantity, "Warehouse stock taken");

    Ok(StockLevel {
        pool: StockPool::Warehouse,
        product_id: product.id,
        name: product.name,
        quantity,
    })
}

fn insufficient(name: &str, available: i64, requested: i64, pool: StockPool) -> DbError {
    CoreError::InsufficientStock {
        product: name.to_string(),
        available,
        requested,
        pool,
    }
    .into()
}
