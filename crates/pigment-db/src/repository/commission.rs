//! # Commission Repository
//!
//! Database operations for agent commission items.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pigment_core::CommissionItem;

const ENTITY: &str = "commission item";

const SELECT_ITEM: &str = r#"
    SELECT
        id,
        agent_name,
        total_product_sold,
        total_product_amount_cents,
        percentage_bps,
        percentage_amount_cents,
        paid_amount_cents,
        paid_status,
        created_at,
        updated_at,
        version
    FROM commission_items
"#;

/// Repository for commission item database operations.
#[derive(Debug, Clone)]
pub struct CommissionRepository {
    pool: SqlitePool,
}

impl CommissionRepository {
    /// Creates a new CommissionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CommissionRepository { pool }
    }

    /// Gets a commission item by ID.
    pub async fn find(&self, id: &str) -> DbResult<Option<CommissionItem>> {
        debug!(item_id = %id, "Loading commission item");

        let item = sqlx::query_as::<_, CommissionItem>(&format!("{SELECT_ITEM} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Lists all commission items by agent name.
    pub async fn find_all(&self) -> DbResult<Vec<CommissionItem>> {
        let items =
            sqlx::query_as::<_, CommissionItem>(&format!("{SELECT_ITEM} ORDER BY agent_name, id"))
                .fetch_all(&self.pool)
                .await?;

        Ok(items)
    }

    /// Inserts a new commission item.
    pub async fn create(&self, item: &CommissionItem) -> DbResult<CommissionItem> {
        debug!(item_id = %item.id, agent = %item.agent_name, "Creating commission item");

        sqlx::query(
            r#"
            INSERT INTO commission_items (
                id, agent_name,
                total_product_sold, total_product_amount_cents,
                percentage_bps, percentage_amount_cents,
                paid_amount_cents, paid_status,
                created_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0)
            "#,
        )
        .bind(&item.id)
        .bind(&item.agent_name)
        .bind(item.total_product_sold)
        .bind(item.total_product_amount_cents)
        .bind(item.percentage_bps)
        .bind(item.percentage_amount_cents)
        .bind(item.paid_amount_cents)
        .bind(item.paid_status)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("id", &item.id),
            other => other,
        })?;

        Ok(CommissionItem {
            version: 0,
            ..item.clone()
        })
    }

    /// Saves totals and payment fields against the loaded version.
    pub async fn save(&self, item: &CommissionItem) -> DbResult<CommissionItem> {
        debug!(
            item_id = %item.id,
            version = item.version,
            total_product_sold = item.total_product_sold,
            paid_amount_cents = item.paid_amount_cents,
            "Saving commission item"
        );

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE commission_items SET
                total_product_sold = ?3,
                total_product_amount_cents = ?4,
                percentage_amount_cents = ?5,
                paid_amount_cents = ?6,
                paid_status = ?7,
                updated_at = ?8,
                version = version + 1
            WHERE id = ?1 AND version = ?2
            "#,
        )
        .bind(&item.id)
        .bind(item.version)
        .bind(item.total_product_sold)
        .bind(item.total_product_amount_cents)
        .bind(item.percentage_amount_cents)
        .bind(item.paid_amount_cents)
        .bind(item.paid_status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_save(&item.id).await?);
        }

        Ok(CommissionItem {
            updated_at: now,
            version: item.version + 1,
            ..item.clone()
        })
    }

    /// Deletes a commission item. Sales linked to it keep their dangling ID.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(item_id = %id, "Deleting commission item");

        let result = sqlx::query("DELETE FROM commission_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn missed_save(&self, id: &str) -> DbResult<DbError> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM commission_items WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists > 0 {
            DbError::conflict(ENTITY, id)
        } else {
            DbError::not_found(ENTITY, id)
        })
    }
}
