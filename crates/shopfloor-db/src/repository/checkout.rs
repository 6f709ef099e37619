//! # Checkout Repository
//!
//! The sale transaction: one normalized cart in, one committed sale out,
//! or nothing at all.
//!
//! ## Transaction Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. INSERT sale (SELECT from the store / legacy product, scoped to    │
//! │      the business and the customer) ← first statement is a write, so   │
//! │      the write lock is held before any stock is read                   │
//! │        └─ no row → explain: StoreNotFound / ProductNotFound /           │
//! │                    CustomerNotFound                                     │
//! │   2. store lines, in order:                                            │
//! │        take_store_stock (check, conditional decrement) → sale_item     │
//! │   3. warehouse lines, in order:                                        │
//! │        take_warehouse_stock → sale_item                                │
//! │   4. outside lines → sale_item (no stock effect)                       │
//! │   5. balance > 0 → merge_open_debt                                     │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error: the Transaction is dropped → ROLLBACK. No sale row, no      │
//! │  stock change, no debt change.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Low-stock alerts are not sent from here. The caller receives the
//! post-sale [`StockLevel`]s and decides what to do after commit.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::customer::customer_in_business;
use crate::repository::debt::merge_open_debt;
use crate::repository::inventory::{take_store_stock, take_warehouse_stock};
use shopfloor_core::{
    CoreError, Debt, Money, NormalizedSale, ProductRef, SaleOrigin, StockLevel, ValidationError,
};

/// Who is selling, as established by the caller's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleContext {
    pub business_id: i64,
    pub seller_id: i64,
}

/// Result of a committed sale.
#[derive(Debug, Clone)]
pub struct CompletedSale {
    pub sale_id: i64,
    pub total: Money,
    pub amount_paid: Money,
    pub balance: Money,
    /// The customer's open debt after this sale, when a balance was carried.
    pub debt: Option<Debt>,
    /// Remaining quantity of every stock-backed line, in cart order.
    pub stock_levels: Vec<StockLevel>,
}

/// Repository running the sale transaction.
#[derive(Debug, Clone)]
pub struct CheckoutRepository {
    pool: SqlitePool,
}

impl CheckoutRepository {
    /// Creates a new CheckoutRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutRepository { pool }
    }

    /// Completes a normalized sale atomically.
    ///
    /// ## Errors
    /// * `DbError::Core(StoreNotFound | ProductNotFound | WarehouseProductNotFound | CustomerNotFound)`
    /// * `DbError::Core(InsufficientStock)` - names the product and the live quantity
    /// * `DbError::Busy` - the write lock was not obtained in time; nothing was written
    ///
    /// ## Example
    /// ```rust,ignore
    /// let sale = normalize_sale(&body)?;
    /// let done = db.checkout().complete_sale(&ctx, &sale).await?;
    /// dispatcher.dispatch(ctx.business_id, &done.stock_levels);
    /// ```
    pub async fn complete_sale(
        &self,
        ctx: &SaleContext,
        sale: &NormalizedSale,
    ) -> DbResult<CompletedSale> {
        debug!(
            business_id = %ctx.business_id,
            seller_id = %ctx.seller_id,
            lines = sale.line_count(),
            total = %sale.total,
            "Completing sale"
        );

        let mut tx = self.pool.begin().await?;

        let sale_id = match insert_sale(&mut tx, ctx, sale).await? {
            Some(id) => id,
            None => return Err(explain_rejected_sale(&mut tx, ctx, sale).await),
        };

        let mut stock_levels =
            Vec::with_capacity(sale.store_items.len() + sale.warehouse_items.len());

        for line in &sale.store_items {
            let level = take_store_stock(&mut tx, ctx.business_id, line).await?;
            insert_sale_item(
                &mut tx,
                sale_id,
                ProductRef::Store(level.product_id),
                &level.name,
                line.quantity,
                line.price,
            )
            .await?;
            stock_levels.push(level);
        }

        for line in &sale.warehouse_items {
            let level = take_warehouse_stock(&mut tx, ctx.business_id, line).await?;
            insert_sale_item(
                &mut tx,
                sale_id,
                ProductRef::Warehouse(level.product_id),
                &level.name,
                line.quantity,
                line.price,
            )
            .await?;
            stock_levels.push(level);
        }

        for line in &sale.outside_items {
            insert_sale_item(
                &mut tx,
                sale_id,
                ProductRef::Outside,
                &line.name,
                line.quantity,
                line.price,
            )
            .await?;
        }

        let debt = if sale.has_balance() {
            let customer_id = sale
                .customer_id
                .ok_or(CoreError::Validation(ValidationError::CustomerRequiredForBalance))?;
            Some(merge_open_debt(&mut tx, ctx.business_id, customer_id, sale.balance).await?)
        } else {
            None
        };

        tx.commit()
            .await
            .map_err(|e| match DbError::from(e) {
                busy @ DbError::Busy(_) => busy,
                other => DbError::TransactionFailed(other.to_string()),
            })?;

        info!(
            sale_id = %sale_id,
            business_id = %ctx.business_id,
            total = %sale.total,
            balance = %sale.balance,
            "Sale completed"
        );

        Ok(CompletedSale {
            sale_id,
            total: sale.total,
            amount_paid: sale.amount_paid,
            balance: sale.balance,
            debt,
            stock_levels,
        })
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

/// Inserts the sale row, selecting its store through the business so a
/// foreign store (or a foreign customer) inserts nothing.
///
/// Cart sales name the store; legacy sales take the store that owns the
/// product.
async fn insert_sale(
    tx: &mut Transaction<'_, Sqlite>,
    ctx: &SaleContext,
    sale: &NormalizedSale,
) -> DbResult<Option<i64>> {
    let (source, key) = match sale.origin {
        SaleOrigin::Cart { store_id } => (
            "SELECT st.id AS store_id FROM stores st WHERE st.id = ?9 AND st.business_id = ?1",
            store_id,
        ),
        SaleOrigin::Legacy => (
            "SELECT sp.store_id FROM store_products sp \
             INNER JOIN stores st ON st.id = sp.store_id \
             WHERE sp.id = ?9 AND st.business_id = ?1",
            legacy_product_id(sale)?,
        ),
    };

    let sql = format!(
        r#"
        INSERT INTO sales (
            store_id, sold_by_id, customer_id, customer_name,
            total, amount_paid, balance, created_at
        )
        SELECT src.store_id, ?2, ?3, ?4, ?5, ?6, ?7, ?8
        FROM ({source}) AS src
        WHERE ?3 IS NULL
           OR EXISTS (SELECT 1 FROM customers c WHERE c.id = ?3 AND c.business_id = ?1)
        RETURNING id
        "#
    );

    let sale_id: Option<i64> = sqlx::query_scalar(&sql)
        .bind(ctx.business_id)
        .bind(ctx.seller_id)
        .bind(sale.customer_id)
        .bind(sale.customer_name.as_deref())
        .bind(sale.total.units())
        .bind(sale.amount_paid.units())
        .bind(sale.balance.units())
        .bind(Utc::now())
        .bind(key)
        .fetch_optional(&mut **tx)
        .await?;

    if let Some(id) = sale_id {
        debug!(sale_id = %id, "Sale row inserted");
    }

    Ok(sale_id)
}

/// Works out why [`insert_sale`] inserted nothing.
async fn explain_rejected_sale(
    tx: &mut Transaction<'_, Sqlite>,
    ctx: &SaleContext,
    sale: &NormalizedSale,
) -> DbError {
    let location = match sale.origin {
        SaleOrigin::Cart { store_id } => sqlx::query_scalar::<_, i64>(
            "SELECT id FROM stores WHERE id = ?1 AND business_id = ?2",
        )
        .bind(store_id)
        .bind(ctx.business_id)
        .fetch_optional(&mut **tx)
        .await
        .map(|found| found.map(|_| ()).ok_or(CoreError::StoreNotFound(store_id))),
        SaleOrigin::Legacy => {
            let product_id = match legacy_product_id(sale) {
                Ok(id) => id,
                Err(err) => return err,
            };
            sqlx::query_scalar::<_, i64>(
                "SELECT sp.id FROM store_products sp \
                 INNER JOIN stores st ON st.id = sp.store_id \
                 WHERE sp.id = ?1 AND st.business_id = ?2",
            )
            .bind(product_id)
            .bind(ctx.business_id)
            .fetch_optional(&mut **tx)
            .await
            .map(|found| found.map(|_| ()).ok_or(CoreError::ProductNotFound(product_id)))
        }
    };

    match location {
        Err(err) => return err.into(),
        Ok(Err(core)) => return core.into(),
        Ok(Ok(())) => {}
    }

    if let Some(customer_id) = sale.customer_id {
        match customer_in_business(tx, ctx.business_id, customer_id).await {
            Ok(false) => return CoreError::CustomerNotFound(customer_id).into(),
            Err(err) => return err,
            Ok(true) => {}
        }
    }

    DbError::TransactionFailed("sale row was not inserted".to_string())
}

fn legacy_product_id(sale: &NormalizedSale) -> DbResult<i64> {
    sale.store_items
        .first()
        .map(|line| line.store_product_id)
        .ok_or_else(|| CoreError::Validation(ValidationError::EmptyCart).into())
}

/// Inserts one sale line. The product reference decides the `source`
/// column and which id column is filled.
async fn insert_sale_item(
    tx: &mut Transaction<'_, Sqlite>,
    sale_id: i64,
    product: ProductRef,
    name: &str,
    quantity: i64,
    price: Money,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            sale_id, source, store_product_id, warehouse_product_id,
            name, quantity, price, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(sale_id)
    .bind(product.source())
    .bind(product.store_product_id())
    .bind(product.warehouse_product_id())
    .bind(name)
    .bind(quantity)
    .bind(price.units())
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::fixtures::{shop, shop_in, Shop};
    use serde_json::json;
    use shopfloor_core::{normalize_sale, LineSource, StockPool};

    fn ctx(shop: &Shop) -> SaleContext {
        SaleContext {
            business_id: shop.business.id,
            seller_id: shop.cashier.id,
        }
    }

    async fn sale_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    async fn store_qty(db: &Database, id: i64) -> i64 {
        sqlx::query_scalar("SELECT quantity FROM store_products WHERE id = ?1")
            .bind(id)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    async fn warehouse_qty(db: &Database, id: i64) -> i64 {
        sqlx::query_scalar("SELECT quantity FROM warehouse_products WHERE id = ?1")
            .bind(id)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_paid_in_full_store_and_outside_lines() {
        let shop = shop().await;
        let sale = normalize_sale(&json!({
            "storeId": shop.store.id,
            "storeItems": [{ "storeProductId": shop.sugar.id, "quantity": 2, "price": 500 }],
            "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 1000 }]
        }))
        .unwrap();

        let done = shop.db.checkout().complete_sale(&ctx(&shop), &sale).await.unwrap();

        assert_eq!(done.total.units(), 2000);
        assert_eq!(done.amount_paid.units(), 2000);
        assert_eq!(done.balance.units(), 0);
        assert!(done.debt.is_none());
        assert_eq!(store_qty(&shop.db, shop.sugar.id).await, 8);

        let items = shop.db.sales().get_items(done.sale_id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source, LineSource::Store);
        assert_eq!(items[0].store_product_id, Some(shop.sugar.id));
        assert_eq!(items[0].name, "Sugar 1kg");
        assert_eq!(items[1].source, LineSource::Outside);
        assert_eq!(items[1].store_product_id, None);
        assert_eq!(items[1].warehouse_product_id, None);
        assert_eq!(items[1].name, "Bag");

        let sale_row = shop
            .db
            .sales()
            .get_by_id(shop.business.id, done.sale_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sale_row.store_id, shop.store.id);
        assert_eq!(sale_row.sold_by_id, shop.cashier.id);
        assert_eq!(sale_row.balance, 0);
    }

    #[tokio::test]
    async fn test_part_payment_merges_into_single_open_debt() {
        let shop = shop().await;
        let body = json!({
            "storeId": shop.store.id,
            "storeItems": [{ "storeProductId": shop.sugar.id, "quantity": 2, "price": 500 }],
            "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 1000 }],
            "amountPaid": 500,
            "customerId": shop.customer.id
        });
        let sale = normalize_sale(&body).unwrap();
        let checkout = shop.db.checkout();

        let first = checkout.complete_sale(&ctx(&shop), &sale).await.unwrap();
        assert_eq!(first.balance.units(), 1500);
        let debt = first.debt.unwrap();
        assert_eq!(debt.balance, 1500);
        assert_eq!(debt.amount_paid, 0);

        let second = checkout.complete_sale(&ctx(&shop), &sale).await.unwrap();
        let merged = second.debt.unwrap();
        assert_eq!(merged.id, debt.id);
        assert_eq!(merged.balance, 3000);
        assert_eq!(merged.total_amount, 3000);

        let open: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM debts WHERE customer_id = ?1 AND is_cleared = 0",
        )
        .bind(shop.customer.id)
        .fetch_one(shop.db.pool())
        .await
        .unwrap();
        assert_eq!(open, 1);
    }

    #[tokio::test]
    async fn test_legacy_credit_sale() {
        let shop = shop().await;
        let sale = normalize_sale(&json!({
            "storeProductId": shop.sugar.id,
            "quantity": 1,
            "price": 500,
            "paymentStatus": "credit",
            "customerId": shop.customer.id
        }))
        .unwrap();

        let done = shop.db.checkout().complete_sale(&ctx(&shop), &sale).await.unwrap();

        assert_eq!(done.amount_paid.units(), 0);
        assert_eq!(done.balance.units(), 500);
        assert_eq!(done.debt.unwrap().balance, 500);
        assert_eq!(store_qty(&shop.db, shop.sugar.id).await, 9);

        let sale_row = shop
            .db
            .sales()
            .get_by_id(shop.business.id, done.sale_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sale_row.store_id, shop.store.id);
        assert_eq!(sale_row.customer_id, Some(shop.customer.id));
    }

    #[tokio::test]
    async fn test_warehouse_line_decrements_warehouse_only() {
        let shop = shop().await;
        let sale = normalize_sale(&json!({
            "storeId": shop.store.id,
            "warehouseItems": [{ "warehouseProductId": shop.rice.id, "quantity": 3, "price": 2500 }]
        }))
        .unwrap();

        let done = shop.db.checkout().complete_sale(&ctx(&shop), &sale).await.unwrap();

        assert_eq!(warehouse_qty(&shop.db, shop.rice.id).await, 1);
        assert_eq!(store_qty(&shop.db, shop.sugar.id).await, 10);
        assert_eq!(
            done.stock_levels,
            vec![StockLevel {
                pool: StockPool::Warehouse,
                product_id: shop.rice.id,
                name: "Rice 50kg".to_string(),
                quantity: 1,
            }]
        );

        let items = shop.db.sales().get_items(done.sale_id).await.unwrap();
        assert_eq!(items[0].source, LineSource::Warehouse);
        assert_eq!(items[0].warehouse_product_id, Some(shop.rice.id));
        assert_eq!(items[0].store_product_id, None);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let shop = shop().await;
        // First line is fine; the second drains more than the warehouse holds.
        let sale = normalize_sale(&json!({
            "storeId": shop.store.id,
            "storeItems": [{ "storeProductId": shop.sugar.id, "quantity": 2, "price": 500 }],
            "warehouseItems": [{ "warehouseProductId": shop.rice.id, "quantity": 5, "price": 2500 }],
            "amountPaid": 0,
            "customerId": shop.customer.id
        }))
        .unwrap();

        let err = shop.db.checkout().complete_sale(&ctx(&shop), &sale).await.unwrap_err();

        match err {
            DbError::Core(CoreError::InsufficientStock { product, available, requested, pool }) => {
                assert_eq!(product, "Rice 50kg");
                assert_eq!(available, 4);
                assert_eq!(requested, 5);
                assert_eq!(pool, StockPool::Warehouse);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(sale_count(&shop.db).await, 0);
        assert_eq!(store_qty(&shop.db, shop.sugar.id).await, 10);
        assert_eq!(warehouse_qty(&shop.db, shop.rice.id).await, 4);
        assert!(shop
            .db
            .debts()
            .open_debt(shop.business.id, shop.customer.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_exact_stock_can_be_sold_to_zero() {
        let shop = shop().await;
        let sale = normalize_sale(&json!({
            "storeId": shop.store.id,
            "storeItems": [{ "storeProductId": shop.sugar.id, "quantity": 10, "price": 500 }]
        }))
        .unwrap();

        let done = shop.db.checkout().complete_sale(&ctx(&shop), &sale).await.unwrap();

        assert_eq!(done.stock_levels[0].quantity, 0);
        assert_eq!(store_qty(&shop.db, shop.sugar.id).await, 0);
    }

    #[tokio::test]
    async fn test_same_product_twice_counts_cumulatively() {
        let shop = shop().await;
        let sale = normalize_sale(&json!({
            "storeId": shop.store.id,
            "storeItems": [
                { "storeProductId": shop.sugar.id, "quantity": 6, "price": 500 },
                { "storeProductId": shop.sugar.id, "quantity": 6, "price": 500 }
            ]
        }))
        .unwrap();

        let err = shop.db.checkout().complete_sale(&ctx(&shop), &sale).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { available: 4, requested: 6, .. })
        ));
        assert_eq!(store_qty(&shop.db, shop.sugar.id).await, 10);
    }

    #[tokio::test]
    async fn test_foreign_store_is_not_found() {
        let shop = shop().await;
        let rival = shop.db.businesses().create_business("Rival").await.unwrap();
        let rival_store = shop.db.businesses().create_store(rival.id, "Rival St").await.unwrap();
        let sale = normalize_sale(&json!({
            "storeId": rival_store.id,
            "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 100 }]
        }))
        .unwrap();

        let err = shop.db.checkout().complete_sale(&ctx(&shop), &sale).await.unwrap_err();

        assert!(matches!(err, DbError::Core(CoreError::StoreNotFound(id)) if id == rival_store.id));
        assert_eq!(sale_count(&shop.db).await, 0);
    }

    #[tokio::test]
    async fn test_foreign_product_is_not_found() {
        let shop = shop().await;
        let rival = shop.db.businesses().create_business("Rival").await.unwrap();
        let rival_store = shop.db.businesses().create_store(rival.id, "Rival St").await.unwrap();
        let foreign = shop
            .db
            .inventory()
            .add_store_product(rival_store.id, "Salt", 5, 100)
            .await
            .unwrap();

        let cart = normalize_sale(&json!({
            "storeId": shop.store.id,
            "storeItems": [{ "storeProductId": foreign.id, "quantity": 1, "price": 100 }]
        }))
        .unwrap();
        let err = shop.db.checkout().complete_sale(&ctx(&shop), &cart).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::ProductNotFound(id)) if id == foreign.id));

        let legacy = normalize_sale(&json!({
            "storeProductId": foreign.id, "quantity": 1, "price": 100
        }))
        .unwrap();
        let err = shop.db.checkout().complete_sale(&ctx(&shop), &legacy).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::ProductNotFound(id)) if id == foreign.id));

        assert_eq!(store_qty(&shop.db, foreign.id).await, 5);
        assert_eq!(sale_count(&shop.db).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_warehouse_product_is_not_found() {
        let shop = shop().await;
        let sale = normalize_sale(&json!({
            "storeId": shop.store.id,
            "warehouseItems": [{ "warehouseProductId": 9999, "quantity": 1, "price": 100 }]
        }))
        .unwrap();

        let err = shop.db.checkout().complete_sale(&ctx(&shop), &sale).await.unwrap_err();

        assert!(matches!(err, DbError::Core(CoreError::WarehouseProductNotFound(9999))));
    }

    #[tokio::test]
    async fn test_foreign_customer_is_not_found() {
        let shop = shop().await;
        let rival = shop.db.businesses().create_business("Rival").await.unwrap();
        let stranger = shop.db.customers().create(rival.id, "Stranger", None).await.unwrap();
        let sale = normalize_sale(&json!({
            "storeId": shop.store.id,
            "storeItems": [{ "storeProductId": shop.sugar.id, "quantity": 1, "price": 500 }],
            "amountPaid": 0,
            "customerId": stranger.id
        }))
        .unwrap();

        let err = shop.db.checkout().complete_sale(&ctx(&shop), &sale).await.unwrap_err();

        assert!(matches!(err, DbError::Core(CoreError::CustomerNotFound(id)) if id == stranger.id));
        assert_eq!(store_qty(&shop.db, shop.sugar.id).await, 10);
        assert_eq!(sale_count(&shop.db).await, 0);
    }

    #[tokio::test]
    async fn test_deleted_product_keeps_sale_line() {
        let shop = shop().await;
        let sale = normalize_sale(&json!({
            "storeId": shop.store.id,
            "storeItems": [{ "storeProductId": shop.sugar.id, "quantity": 1, "price": 500 }]
        }))
        .unwrap();
        let done = shop.db.checkout().complete_sale(&ctx(&shop), &sale).await.unwrap();

        sqlx::query("DELETE FROM store_products WHERE id = ?1")
            .bind(shop.sugar.id)
            .execute(shop.db.pool())
            .await
            .unwrap();

        let items = shop.db.sales().get_items(done.sale_id).await.unwrap();
        assert_eq!(items[0].name, "Sugar 1kg");
        assert_eq!(items[0].store_product_id, None);
        assert_eq!(items[0].product_ref(), ProductRef::Outside);
    }

    /// Several tills selling the last units of one product at the same time.
    /// Uses an on-disk database so each sale gets its own connection.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        let path = std::env::temp_dir()
            .join(format!("shopfloor-oversell-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(path.clone()).max_connections(8))
            .await
            .unwrap();
        let shop = shop_in(db).await;
        let stock = store_qty(&shop.db, shop.sugar.id).await;

        let sale = normalize_sale(&json!({
            "storeId": shop.store.id,
            "storeItems": [{ "storeProductId": shop.sugar.id, "quantity": 3, "price": 500 }]
        }))
        .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let checkout = shop.db.checkout();
            let sale = sale.clone();
            let till = ctx(&shop);
            handles.push(tokio::spawn(async move {
                checkout.complete_sale(&till, &sale).await
            }));
        }

        let mut sold = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(done) => {
                    assert!(done.stock_levels[0].quantity >= 0);
                    sold += 3;
                }
                Err(DbError::Core(CoreError::InsufficientStock { .. })) | Err(DbError::Busy(_)) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        let remaining = store_qty(&shop.db, shop.sugar.id).await;
        assert!(remaining >= 0);
        assert!(sold <= stock);
        assert_eq!(remaining, stock - sold);
        assert_eq!(sale_count(&shop.db).await, sold / 3);

        shop.db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
