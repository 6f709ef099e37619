//! # Business Repository
//!
//! Tenants and the things that hang directly off them: users, stores,
//! warehouses and device push tokens.
//!
//! The sale flow only reads from here (store lookup, alert recipient);
//! the create operations serve the seed binary and tests.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shopfloor_core::{AlertRecipient, Business, Store, User, UserRole, Warehouse};

/// Repository for business directory operations.
#[derive(Debug, Clone)]
pub struct BusinessRepository {
    pool: SqlitePool,
}

impl BusinessRepository {
    /// Creates a new BusinessRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BusinessRepository { pool }
    }

    pub async fn create_business(&self, name: &str) -> DbResult<Business> {
        debug!(name = %name, "Creating business");

        let business = sqlx::query_as::<_, Business>(
            r#"
            INSERT INTO businesses (name, created_at)
            VALUES (?1, ?2)
            RETURNING id, name
            "#,
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(business)
    }

    /// Creates a user. `business_id` is `None` for users not yet attached
    /// to a business.
    pub async fn create_user(
        &self,
        business_id: Option<i64>,
        full_name: &str,
        role: UserRole,
    ) -> DbResult<User> {
        debug!(business_id = ?business_id, full_name = %full_name, role = ?role, "Creating user");

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (business_id, full_name, role, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, business_id, full_name, role
            "#,
        )
        .bind(business_id)
        .bind(full_name)
        .bind(role)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, business_id, full_name, role FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn create_store(&self, business_id: i64, name: &str) -> DbResult<Store> {
        debug!(business_id = %business_id, name = %name, "Creating store");

        let store = sqlx::query_as::<_, Store>(
            r#"
            INSERT INTO stores (business_id, name, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, business_id, name
            "#,
        )
        .bind(business_id)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(store)
    }

    /// Gets a store, but only if it belongs to `business_id`.
    pub async fn get_store(&self, business_id: i64, store_id: i64) -> DbResult<Option<Store>> {
        let store = sqlx::query_as::<_, Store>(
            "SELECT id, business_id, name FROM stores WHERE id = ?1 AND business_id = ?2",
        )
        .bind(store_id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }

    pub async fn create_warehouse(&self, business_id: i64, name: &str) -> DbResult<Warehouse> {
        debug!(business_id = %business_id, name = %name, "Creating warehouse");

        let warehouse = sqlx::query_as::<_, Warehouse>(
            r#"
            INSERT INTO warehouses (business_id, name, created_at)
            VALUES (?1, ?2, ?3)
            RETURNING id, business_id, name
            "#,
        )
        .bind(business_id)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(warehouse)
    }

    /// Registers (or replaces) the device push token of a user.
    pub async fn set_push_token(&self, user_id: i64, token: &str) -> DbResult<()> {
        debug!(user_id = %user_id, "Registering push token");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO push_tokens (user_id, token, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT (user_id) DO UPDATE SET
                token = excluded.token,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Finds who receives low-stock alerts for a business: its SUPERADMIN
    /// (lowest id if several) and their push token, if registered.
    pub async fn find_alert_recipient(&self, business_id: i64) -> DbResult<Option<AlertRecipient>> {
        let recipient = sqlx::query_as::<_, AlertRecipient>(
            r#"
            SELECT
                u.id AS user_id,
                u.full_name,
                pt.token
            FROM users u
            LEFT JOIN push_tokens pt ON pt.user_id = u.id
            WHERE u.business_id = ?1
              AND u.role = 'SUPERADMIN'
            ORDER BY u.id
            LIMIT 1
            "#,
        )
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recipient)
    }
}
