//! # Customer Repository
//!
//! Customers of a business and the POS customer picker.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::contains_pattern;
use shopfloor_core::{Customer, CustomerMatch};

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn create(
        &self,
        business_id: i64,
        full_name: &str,
        phone: Option<&str>,
    ) -> DbResult<Customer> {
        debug!(business_id = %business_id, full_name = %full_name, "Creating customer");

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (business_id, full_name, phone, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, business_id, full_name, phone, created_at
            "#,
        )
        .bind(business_id)
        .bind(full_name)
        .bind(phone)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer, but only if it belongs to `business_id`.
    pub async fn get(&self, business_id: i64, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, business_id, full_name, phone, created_at
            FROM customers
            WHERE id = ?1 AND business_id = ?2
            "#,
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Customer picker: name or phone contains `query`, ordered by name.
    ///
    /// Each row carries the sum of the customer's open debt balances so the
    /// cashier sees what is already owed before selling on credit.
    /// Name matching folds ASCII case only.
    pub async fn search(
        &self,
        business_id: i64,
        query: &str,
        limit: i64,
    ) -> DbResult<Vec<CustomerMatch>> {
        debug!(business_id = %business_id, query = %query, "Searching customers");

        let matches = sqlx::query_as::<_, CustomerMatch>(
            r#"
            SELECT
                c.id,
                c.full_name,
                c.phone,
                COALESCE((
                    SELECT SUM(d.balance)
                    FROM debts d
                    WHERE d.customer_id = c.id
                      AND d.business_id = c.business_id
                      AND d.is_cleared = 0
                ), 0) AS total_debt
            FROM customers c
            WHERE c.business_id = ?1
              AND (c.full_name LIKE ?2 ESCAPE '\' OR c.phone LIKE ?2 ESCAPE '\')
            ORDER BY c.full_name, c.id
            LIMIT ?3
            "#,
        )
        .bind(business_id)
        .bind(contains_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(matches)
    }
}

/// True when the customer exists in `business_id`. Runs inside the sale
/// transaction.
pub(crate) async fn customer_in_business(
    tx: &mut Transaction<'_, Sqlite>,
    business_id: i64,
    customer_id: i64,
) -> DbResult<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT id FROM customers WHERE id = ?1 AND business_id = ?2")
            .bind(customer_id)
            .bind(business_id)
            .fetch_optional(&mut **tx)
            .await?;

    Ok(found.is_some())
}
