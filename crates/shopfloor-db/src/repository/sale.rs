//! # Sale Repository
//!
//! Read side of completed sales: single sale, its lines, the printable
//! receipt and the sales list. Sales are written only by
//! [`CheckoutRepository`](super::checkout::CheckoutRepository).
//!
//! ## Receipt Assembly
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales ⋈ stores ⋈ users (⟕ customers)    → header                      │
//! │  sale_items WHERE sale_id = ?            → lines (+ subtotal)          │
//! │  debts (open, same customer)             → totalDebt                   │
//! │                                                                         │
//! │  previousDebt = max(0, totalDebt - balance)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::contains_pattern;
use shopfloor_core::{Receipt, ReceiptLine, Sale, SaleItem, SaleSummary};

/// Repository for completed sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

/// Receipt header row.
#[derive(Debug, sqlx::FromRow)]
struct ReceiptHeader {
    id: i64,
    store_name: String,
    sold_by_name: String,
    customer_id: Option<i64>,
    customer_name: Option<String>,
    total: i64,
    amount_paid: i64,
    balance: i64,
    created_at: DateTime<Utc>,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale, but only if its store belongs to `business_id`.
    pub async fn get_by_id(&self, business_id: i64, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                s.id,
                s.store_id,
                s.sold_by_id,
                s.customer_id,
                s.customer_name,
                s.total,
                s.amount_paid,
                s.balance,
                s.created_at
            FROM sales s
            INNER JOIN stores st ON st.id = s.store_id
            WHERE s.id = ?1 AND st.business_id = ?2
            "#,
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all lines of a sale in the order they were sold.
    pub async fn get_items(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT
                id,
                sale_id,
                source,
                store_product_id,
                warehouse_product_id,
                name,
                quantity,
                price,
                created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Builds the printable receipt of a sale.
    ///
    /// The customer name is the linked customer's, falling back to the
    /// free-text name typed at the till.
    ///
    /// ## Returns
    /// * `Ok(None)` - no such sale in this business
    pub async fn get_receipt(&self, business_id: i64, sale_id: i64) -> DbResult<Option<Receipt>> {
        debug!(business_id = %business_id, sale_id = %sale_id, "Building receipt");

        let header = sqlx::query_as::<_, ReceiptHeader>(
            r#"
            SELECT
                s.id,
                st.name AS store_name,
                u.full_name AS sold_by_name,
                s.customer_id,
                COALESCE(c.full_name, s.customer_name) AS customer_name,
                s.total,
                s.amount_paid,
                s.balance,
                s.created_at
            FROM sales s
            INNER JOIN stores st ON st.id = s.store_id
            INNER JOIN users u ON u.id = s.sold_by_id
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE s.id = ?1 AND st.business_id = ?2
            "#,
        )
        .bind(sale_id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let items = self
            .get_items(header.id)
            .await?
            .into_iter()
            .map(|item| ReceiptLine {
                subtotal: item.subtotal(),
                name: item.name,
                source: item.source,
                quantity: item.quantity,
                price: item.price,
            })
            .collect();

        let total_debt = match header.customer_id {
            Some(customer_id) => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT COALESCE(SUM(balance), 0)
                    FROM debts
                    WHERE customer_id = ?1 AND business_id = ?2 AND is_cleared = 0
                    "#,
                )
                .bind(customer_id)
                .bind(business_id)
                .fetch_one(&self.pool)
                .await?
            }
            None => 0,
        };

        Ok(Some(Receipt {
            id: header.id,
            store: header.store_name,
            sold_by: header.sold_by_name,
            created_at: header.created_at,
            customer_name: header.customer_name,
            items,
            total: header.total,
            amount_paid: header.amount_paid,
            balance: header.balance,
            previous_debt: (total_debt - header.balance).max(0),
            total_debt,
        }))
    }

    /// Sales of a business, newest first.
    ///
    /// `query` filters on the free-text customer name typed at the till or
    /// the linked customer's registered name, folding ASCII case only.
    pub async fn list(
        &self,
        business_id: i64,
        query: Option<&str>,
        limit: i64,
    ) -> DbResult<Vec<SaleSummary>> {
        debug!(business_id = %business_id, query = ?query, "Listing sales");

        let sales = sqlx::query_as::<_, SaleSummary>(
            r#"
            SELECT
                s.id,
                s.store_id,
                st.name AS store_name,
                s.sold_by_id,
                u.full_name AS sold_by_name,
                s.customer_id,
                s.customer_name,
                c.full_name AS customer_full_name,
                s.total,
                s.amount_paid,
                s.balance,
                s.created_at
            FROM sales s
            INNER JOIN stores st ON st.id = s.store_id
            INNER JOIN users u ON u.id = s.sold_by_id
            LEFT JOIN customers c ON c.id = s.customer_id
            WHERE st.business_id = ?1
              AND (?2 IS NULL
                   OR s.customer_name LIKE ?2 ESCAPE '\'
                   OR c.full_name LIKE ?2 ESCAPE '\')
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT ?3
            "#,
        )
        .bind(business_id)
        .bind(query.map(contains_pattern))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}
