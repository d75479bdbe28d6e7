//! # Stock Repository
//!
//! Database operations for stock units.
//!
//! ## Optimistic Save
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    save(stock @ version 3)                              │
//! │                                                                         │
//! │  UPDATE stocks SET ..., version = version + 1                          │
//! │  WHERE stock_id = 'S1' AND version = 3                                 │
//! │       │                                                                 │
//! │       ├── 1 row  → Ok(stock @ version 4)                               │
//! │       │                                                                 │
//! │       └── 0 rows → row still there?                                    │
//! │                    ├── yes → DbError::Conflict (someone saved first)   │
//! │                    └── no  → DbError::NotFound (deleted meanwhile)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pigment_core::Stock;

const ENTITY: &str = "stock";

const SELECT_STOCK: &str = r#"
    SELECT
        stock_id,
        brand_name,
        item_name,
        colour_name,
        unit,
        total_product,
        remaining,
        rate_cents,
        refund_quantity,
        refund_status,
        created_at,
        updated_at,
        version
    FROM stocks
"#;

/// Repository for stock unit database operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Gets a stock unit by its stock ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Stock))` - Stock unit found
    /// * `Ok(None)` - Stock unit not found
    pub async fn find(&self, stock_id: &str) -> DbResult<Option<Stock>> {
        debug!(stock_id = %stock_id, "Loading stock");

        let stock = sqlx::query_as::<_, Stock>(&format!("{SELECT_STOCK} WHERE stock_id = ?1"))
            .bind(stock_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(stock)
    }

    /// Lists all stock units, newest first.
    pub async fn find_all(&self) -> DbResult<Vec<Stock>> {
        let stocks = sqlx::query_as::<_, Stock>(&format!(
            "{SELECT_STOCK} ORDER BY created_at DESC, stock_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = stocks.len(), "Loaded stocks");
        Ok(stocks)
    }

    /// Inserts a new stock unit.
    ///
    /// ## Returns
    /// * `Ok(Stock)` - The stored record (version 0)
    /// * `Err(DbError::UniqueViolation)` - Stock ID already exists
    pub async fn create(&self, stock: &Stock) -> DbResult<Stock> {
        debug!(stock_id = %stock.stock_id, "Creating stock");

        sqlx::query(
            r#"
            INSERT INTO stocks (
                stock_id, brand_name, item_name, colour_name, unit,
                total_product, remaining, rate_cents,
                refund_quantity, refund_status,
                created_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0)
            "#,
        )
        .bind(&stock.stock_id)
        .bind(&stock.brand_name)
        .bind(&stock.item_name)
        .bind(&stock.colour_name)
        .bind(&stock.unit)
        .bind(stock.total_product)
        .bind(stock.remaining)
        .bind(stock.rate_cents)
        .bind(stock.refund_quantity)
        .bind(stock.refund_status)
        .bind(stock.created_at)
        .bind(stock.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("stock_id", &stock.stock_id),
            other => other,
        })?;

        Ok(Stock {
            version: 0,
            ..stock.clone()
        })
    }

    /// Saves the mutable fields of a stock unit if nobody saved it since it
    /// was loaded.
    ///
    /// ## Returns
    /// * `Ok(Stock)` - The stored record with its new version
    /// * `Err(DbError::Conflict)` - `stock.version` is stale
    /// * `Err(DbError::NotFound)` - Stock unit was deleted
    pub async fn save(&self, stock: &Stock) -> DbResult<Stock> {
        debug!(
            stock_id = %stock.stock_id,
            version = stock.version,
            remaining = stock.remaining,
            refund_quantity = stock.refund_quantity,
            "Saving stock"
        );

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE stocks SET
                remaining = ?3,
                refund_quantity = ?4,
                refund_status = ?5,
                updated_at = ?6,
                version = version + 1
            WHERE stock_id = ?1 AND version = ?2
            "#,
        )
        .bind(&stock.stock_id)
        .bind(stock.version)
        .bind(stock.remaining)
        .bind(stock.refund_quantity)
        .bind(stock.refund_status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_save(&stock.stock_id).await?);
        }

        Ok(Stock {
            updated_at: now,
            version: stock.version + 1,
            ..stock.clone()
        })
    }

    /// Deletes a stock unit. Sales of it are left untouched.
    ///
    /// ## Returns
    /// `true` if a row was deleted.
    pub async fn delete(&self, stock_id: &str) -> DbResult<bool> {
        debug!(stock_id = %stock_id, "Deleting stock");

        let result = sqlx::query("DELETE FROM stocks WHERE stock_id = ?1")
            .bind(stock_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts stock units (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stocks")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Classifies a zero-row save.
    async fn missed_save(&self, stock_id: &str) -> DbResult<DbError> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stocks WHERE stock_id = ?1")
            .bind(stock_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists > 0 {
            DbError::conflict(ENTITY, stock_id)
        } else {
            DbError::not_found(ENTITY, stock_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use pigment_core::{Money, NewStock, RefundStatus};

    async fn repo() -> (Database, StockRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.stocks();
        (db, repo)
    }

    fn new_stock(id: &str) -> Stock {
        Stock::from_new(
            NewStock {
                stock_id: id.to_string(),
                brand_name: "Weldon".to_string(),
                item_name: "Emulsion".to_string(),
                colour_name: "White".to_string(),
                unit: "Gallon".to_string(),
                total_product: 100,
                rate: Money::from_cents(5000),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (_db, repo) = repo().await;
        repo.create(&new_stock("S1")).await.unwrap();

        let found = repo.find("S1").await.unwrap().unwrap();
        assert_eq!(found.remaining, 100);
        assert_eq!(found.rate_cents, 5000);
        assert_eq!(found.refund_status, RefundStatus::None);
        assert_eq!(found.version, 0);

        assert!(repo.find("missing").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_stock_id() {
        let (_db, repo) = repo().await;
        repo.create(&new_stock("S1")).await.unwrap();

        let err = repo.create(&new_stock("S1")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "S1"));
    }

    #[tokio::test]
    async fn test_save_bumps_version_and_detects_stale_writes() {
        let (_db, repo) = repo().await;
        let stock = repo.create(&new_stock("S1")).await.unwrap();

        let mut first = stock.clone();
        first.remaining = 80;
        let saved = repo.save(&first).await.unwrap();
        assert_eq!(saved.version, 1);

        let mut stale = stock;
        stale.remaining = 70;
        let err = repo.save(&stale).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        let current = repo.find("S1").await.unwrap().unwrap();
        assert_eq!(current.remaining, 80);
        assert_eq!(current.version, 1);
    }

    #[tokio::test]
    async fn test_save_after_delete_is_not_found() {
        let (_db, repo) = repo().await;
        let stock = repo.create(&new_stock("S1")).await.unwrap();

        assert!(repo.delete("S1").await.unwrap());
        assert!(!repo.delete("S1").await.unwrap());

        let err = repo.save(&stock).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
