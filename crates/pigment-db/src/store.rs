//! # Record Store Seam
//!
//! The ledger talks to storage only through [`RecordStore`]. [`Database`]
//! implements it over SQLite; tests wrap it to inject failures.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  find_*    → Ok(None) when absent, never NotFound                       │
//! │  create_*  → UniqueViolation when the key exists                        │
//! │  save_*    → Conflict when the record changed since it was loaded       │
//! │              NotFound when it was deleted                               │
//! │  delete_*  → Ok(false) when absent                                      │
//! │                                                                         │
//! │  Every write is durable on its own. Nothing spans two records.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;

use crate::error::DbResult;
use crate::pool::Database;
use pigment_core::{CommissionItem, Sale, Stock};

/// Durable key-indexed storage for stock units, sales and commission items.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ---- Stock --------------------------------------------------------------

    async fn find_stock(&self, stock_id: &str) -> DbResult<Option<Stock>>;

    async fn find_stocks(&self) -> DbResult<Vec<Stock>>;

    async fn create_stock(&self, stock: &Stock) -> DbResult<Stock>;

    async fn save_stock(&self, stock: &Stock) -> DbResult<Stock>;

    async fn delete_stock(&self, stock_id: &str) -> DbResult<bool>;

    // ---- Sale ---------------------------------------------------------------

    async fn find_sale(&self, stock_id: &str, sale_id: &str) -> DbResult<Option<Sale>>;

    async fn find_sale_by_id(&self, sale_id: &str) -> DbResult<Option<Sale>>;

    async fn find_sales_for_stock(&self, stock_id: &str) -> DbResult<Vec<Sale>>;

    async fn find_sales(&self) -> DbResult<Vec<Sale>>;

    async fn create_sale(&self, sale: &Sale) -> DbResult<Sale>;

    async fn save_sale(&self, sale: &Sale) -> DbResult<Sale>;

    async fn delete_sale(&self, sale_id: &str) -> DbResult<bool>;

    // ---- Commission ---------------------------------------------------------

    async fn find_commission_item(&self, id: &str) -> DbResult<Option<CommissionItem>>;

    async fn find_commission_items(&self) -> DbResult<Vec<CommissionItem>>;

    async fn create_commission_item(&self, item: &CommissionItem) -> DbResult<CommissionItem>;

    async fn save_commission_item(&self, item: &CommissionItem) -> DbResult<CommissionItem>;

    async fn delete_commission_item(&self, id: &str) -> DbResult<bool>;
}

#[async_trait]
impl RecordStore for Database {
    async fn find_stock(&self, stock_id: &str) -> DbResult<Option<Stock>> {
        self.stocks().find(stock_id).await
    }

    async fn find_stocks(&self) -> DbResult<Vec<Stock>> {
        self.stocks().find_all().await
    }

    async fn create_stock(&self, stock: &Stock) -> DbResult<Stock> {
        self.stocks().create(stock).await
    }

    async fn save_stock(&self, stock: &Stock) -> DbResult<Stock> {
        self.stocks().save(stock).await
    }

    async fn delete_stock(&self, stock_id: &str) -> DbResult<bool> {
        self.stocks().delete(stock_id).await
    }

    async fn find_sale(&self, stock_id: &str, sale_id: &str) -> DbResult<Option<Sale>> {
        self.sales().find(stock_id, sale_id).await
    }

    async fn find_sale_by_id(&self, sale_id: &str) -> DbResult<Option<Sale>> {
        self.sales().find_by_id(sale_id).await
    }

    async fn find_sales_for_stock(&self, stock_id: &str) -> DbResult<Vec<Sale>> {
        self.sales().find_by_stock(stock_id).await
    }

    async fn find_sales(&self) -> DbResult<Vec<Sale>> {
        self.sales().find_all().await
    }

    async fn create_sale(&self, sale: &Sale) -> DbResult<Sale> {
        self.sales().create(sale).await
    }

    async fn save_sale(&self, sale: &Sale) -> DbResult<Sale> {
        self.sales().save(sale).await
    }

    async fn delete_sale(&self, sale_id: &str) -> DbResult<bool> {
        self.sales().delete(sale_id).await
    }

    async fn find_commission_item(&self, id: &str) -> DbResult<Option<CommissionItem>> {
        self.commissions().find(id).await
    }

    async fn find_commission_items(&self) -> DbResult<Vec<CommissionItem>> {
        self.commissions().find_all().await
    }

    async fn create_commission_item(&self, item: &CommissionItem) -> DbResult<CommissionItem> {
        self.commissions().create(item).await
    }

    async fn save_commission_item(&self, item: &CommissionItem) -> DbResult<CommissionItem> {
        self.commissions().save(item).await
    }

    async fn delete_commission_item(&self, id: &str) -> DbResult<bool> {
        self.commissions().delete(id).await
    }
}
