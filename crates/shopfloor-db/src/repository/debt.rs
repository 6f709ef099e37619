//! # Debt Ledger
//!
//! A customer owes through at most one open debt row per business. Every
//! part-payment or credit sale adds its balance to that row.
//!
//! ## Merge
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sale balance 1500 for customer 9                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO debts (...) VALUES (9, biz, 1500, 0, 1500, 0, ...)        │
//! │  ON CONFLICT (customer_id, business_id) WHERE is_cleared = 0           │
//! │  DO UPDATE SET total_amount += 1500, balance += 1500                   │
//! │       │                                                                 │
//! │       ├── no open row  → new row {total 1500, paid 0, balance 1500}    │
//! │       └── open row     → same row, both counters grow by 1500          │
//! │                                                                         │
//! │  idx_debts_one_open (partial unique index) makes a second open row      │
//! │  impossible, so there is no read-then-write window.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::DbResult;
use shopfloor_core::{Debt, Money};

const DEBT_COLUMNS: &str =
    "id, customer_id, business_id, total_amount, amount_paid, balance, is_cleared, created_at, updated_at";

/// Read access to the debt ledger.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    pool: SqlitePool,
}

impl DebtRepository {
    /// Creates a new DebtRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DebtRepository { pool }
    }

    /// The customer's open debt in `business_id`, if any.
    pub async fn open_debt(&self, business_id: i64, customer_id: i64) -> DbResult<Option<Debt>> {
        let debt = sqlx::query_as::<_, Debt>(&format!(
            "SELECT {DEBT_COLUMNS} FROM debts \
             WHERE customer_id = ?1 AND business_id = ?2 AND is_cleared = 0"
        ))
        .bind(customer_id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(debt)
    }

    /// Sum of open balances for the customer (0 when nothing is owed).
    pub async fn outstanding_balance(&self, business_id: i64, customer_id: i64) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(balance), 0)
            FROM debts
            WHERE customer_id = ?1 AND business_id = ?2 AND is_cleared = 0
            "#,
        )
        .bind(customer_id)
        .bind(business_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

/// Adds `amount` to the customer's open debt, creating it if none is open.
/// Runs inside the sale transaction.
pub(crate) async fn merge_open_debt(
    tx: &mut Transaction<'_, Sqlite>,
    business_id: i64,
    customer_id: i64,
    amount: Money,
) -> DbResult<Debt> {
    let debt = sqlx::query_as::<_, Debt>(&format!(
        r#"
        INSERT INTO debts (
            customer_id, business_id,
            total_amount, amount_paid, balance, is_cleared,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, 0, ?3, 0, ?4, ?4)
        ON CONFLICT (customer_id, business_id) WHERE is_cleared = 0
        DO UPDATE SET
            total_amount = debts.total_amount + excluded.total_amount,
            balance = debts.balance + excluded.balance,
            updated_at = excluded.updated_at
        RETURNING {DEBT_COLUMNS}
        "#
    ))
    .bind(customer_id)
    .bind(business_id)
    .bind(amount.units())
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await?;

    debug!(
        debt_id = %debt.id,
        customer_id = %customer_id,
        added = %amount,
        balance = %debt.balance,
        "Merged balance into open debt"
    );

    Ok(debt)
}
