//! # Sale Repository
//!
//! Database operations for sale records.
//!
//! Sales are keyed by `sale_id` and linked to their stock unit by the
//! `stock_id` value only. Lookups used by the refund flow match on both
//! so a sale ID typed against the wrong stock unit is reported as missing.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pigment_core::Sale;

const ENTITY: &str = "sale";

const SELECT_SALE: &str = r#"
    SELECT
        sale_id,
        stock_id,
        brand_name,
        item_name,
        colour_name,
        unit,
        quantity_sold,
        rate_cents,
        profit_cents,
        refund_quantity,
        refund_status,
        agent_item_id,
        created_at,
        updated_at,
        version
    FROM sales
"#;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by (stock ID, sale ID).
    pub async fn find(&self, stock_id: &str, sale_id: &str) -> DbResult<Option<Sale>> {
        debug!(stock_id = %stock_id, sale_id = %sale_id, "Loading sale");

        let sale = sqlx::query_as::<_, Sale>(&format!(
            "{SELECT_SALE} WHERE sale_id = ?1 AND stock_id = ?2"
        ))
        .bind(sale_id)
        .bind(stock_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale by sale ID alone. Sale IDs are unique across stock units.
    pub async fn find_by_id(&self, sale_id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!("{SELECT_SALE} WHERE sale_id = ?1"))
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Lists every sale of a stock unit, oldest first.
    ///
    /// ## Usage
    /// Source of truth for the stock unit's refund aggregate.
    pub async fn find_by_stock(&self, stock_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "{SELECT_SALE} WHERE stock_id = ?1 ORDER BY created_at, sale_id"
        ))
        .bind(stock_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(stock_id = %stock_id, count = sales.len(), "Loaded sales for stock");
        Ok(sales)
    }

    /// Lists all sales, newest first.
    pub async fn find_all(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "{SELECT_SALE} ORDER BY created_at DESC, sale_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = sales.len(), "Loaded sales");
        Ok(sales)
    }

    /// Inserts a new sale.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - The stored record (version 0)
    /// * `Err(DbError::UniqueViolation)` - Sale ID already exists
    pub async fn create(&self, sale: &Sale) -> DbResult<Sale> {
        debug!(sale_id = %sale.sale_id, stock_id = %sale.stock_id, "Creating sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                sale_id, stock_id, brand_name, item_name, colour_name, unit,
                quantity_sold, rate_cents, profit_cents,
                refund_quantity, refund_status, agent_item_id,
                created_at, updated_at, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 0)
            "#,
        )
        .bind(&sale.sale_id)
        .bind(&sale.stock_id)
        .bind(&sale.brand_name)
        .bind(&sale.item_name)
        .bind(&sale.colour_name)
        .bind(&sale.unit)
        .bind(sale.quantity_sold)
        .bind(sale.rate_cents)
        .bind(sale.profit_cents)
        .bind(sale.refund_quantity)
        .bind(sale.refund_status)
        .bind(&sale.agent_item_id)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("sale_id", &sale.sale_id),
            other => other,
        })?;

        Ok(Sale {
            version: 0,
            ..sale.clone()
        })
    }

    /// Saves the refund-mutable fields of a sale against its loaded version.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - The stored record with its new version
    /// * `Err(DbError::Conflict)` - `sale.version` is stale
    /// * `Err(DbError::NotFound)` - Sale was deleted
    pub async fn save(&self, sale: &Sale) -> DbResult<Sale> {
        debug!(
            sale_id = %sale.sale_id,
            version = sale.version,
            refund_quantity = sale.refund_quantity,
            profit_cents = sale.profit_cents,
            "Saving sale"
        );

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE sales SET
                profit_cents = ?3,
                refund_quantity = ?4,
                refund_status = ?5,
                agent_item_id = ?6,
                updated_at = ?7,
                version = version + 1
            WHERE sale_id = ?1 AND version = ?2
            "#,
        )
        .bind(&sale.sale_id)
        .bind(sale.version)
        .bind(sale.profit_cents)
        .bind(sale.refund_quantity)
        .bind(sale.refund_status)
        .bind(&sale.agent_item_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_save(&sale.sale_id).await?);
        }

        Ok(Sale {
            updated_at: now,
            version: sale.version + 1,
            ..sale.clone()
        })
    }

    /// Deletes a sale. The stock unit and commission item are not adjusted.
    pub async fn delete(&self, sale_id: &str) -> DbResult<bool> {
        debug!(sale_id = %sale_id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn missed_save(&self, sale_id: &str) -> DbResult<DbError> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE sale_id = ?1")
            .bind(sale_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(if exists > 0 {
            DbError::conflict(ENTITY, sale_id)
        } else {
            DbError::not_found(ENTITY, sale_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use pigment_core::{Money, NewSale, RefundStatus};

    fn new_sale(stock_id: &str, sale_id: &str, agent: Option<&str>) -> Sale {
        Sale::from_new(
            NewSale {
                stock_id: stock_id.to_string(),
                sale_id: sale_id.to_string(),
                quantity_sold: 20,
                rate: Money::from_cents(8000),
                brand_name: "Weldon".to_string(),
                item_name: "Emulsion".to_string(),
                colour_name: "White".to_string(),
                unit: "Gallon".to_string(),
                agent_item_id: agent.map(str::to_string),
            },
            Money::from_cents(5000),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_find_requires_matching_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();
        repo.create(&new_sale("S1", "SALE1", Some("A1"))).await.unwrap();

        let found = repo.find("S1", "SALE1").await.unwrap().unwrap();
        assert_eq!(found.profit_cents, 60_000);
        assert_eq!(found.agent_item_id.as_deref(), Some("A1"));
        assert!(repo.find("S2", "SALE1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();
        repo.create(&new_sale("S1", "SALE1", None)).await.unwrap();
        repo.create(&new_sale("S1", "SALE2", None)).await.unwrap();
        repo.create(&new_sale("S2", "SALE3", None)).await.unwrap();

        let sales = repo.find_by_stock("S1").await.unwrap();
        assert_eq!(sales.len(), 2);
        assert!(sales.iter().all(|s| s.stock_id == "S1"));
        assert_eq!(repo.find_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_save_refund_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();
        let mut sale = repo.create(&new_sale("S1", "SALE1", None)).await.unwrap();

        sale.apply_refund(5, Money::from_cents(5000)).unwrap();
        let saved = repo.save(&sale).await.unwrap();
        assert_eq!(saved.version, 1);

        let stored = repo.find("S1", "SALE1").await.unwrap().unwrap();
        assert_eq!(stored.refund_quantity, 5);
        assert_eq!(stored.refund_status, RefundStatus::PartiallyRefunded);
        assert_eq!(stored.profit_cents, 45_000);

        let err = repo.save(&sale).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }
}
