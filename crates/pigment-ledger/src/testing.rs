//! Test fixtures: in-memory stores and a store wrapper that fails on demand.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use pigment_core::{CommissionItem, Money, NewSale, NewStock, Sale, Stock};
use pigment_db::{Database, DbConfig, DbError, DbResult, RecordStore};

pub async fn memory_store() -> Arc<dyn RecordStore> {
    Arc::new(Database::new(DbConfig::in_memory()).await.unwrap())
}

pub fn new_stock(stock_id: &str, total: i64, rate_major: i64) -> NewStock {
    NewStock {
        stock_id: stock_id.to_string(),
        brand_name: "Dulux".to_string(),
        item_name: "Weathershield".to_string(),
        colour_name: "Brilliant White".to_string(),
        unit: "4L".to_string(),
        total_product: total,
        rate: Money::from_major_minor(rate_major, 0),
    }
}

pub fn new_sale(stock_id: &str, sale_id: &str, qty: i64, rate_major: i64) -> NewSale {
    NewSale {
        stock_id: stock_id.to_string(),
        sale_id: sale_id.to_string(),
        quantity_sold: qty,
        rate: Money::from_major_minor(rate_major, 0),
        brand_name: "Dulux".to_string(),
        item_name: "Weathershield".to_string(),
        colour_name: "Brilliant White".to_string(),
        unit: "4L".to_string(),
        agent_item_id: None,
    }
}

// =============================================================================
// Fault Injection
// =============================================================================

/// Store writes that [`FaultyStore`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    SaveStock,
    CreateSale,
    SaveSale,
    SaveCommissionItem,
}

/// Delegates to a real store, failing the armed writes.
pub struct FaultyStore {
    inner: Arc<dyn RecordStore>,
    armed: Mutex<HashSet<Fault>>,
}

impl FaultyStore {
    pub async fn in_memory() -> Arc<Self> {
        Arc::new(FaultyStore {
            inner: memory_store().await,
            armed: Mutex::new(HashSet::new()),
        })
    }

    pub fn arm(&self, fault: Fault) {
        self.armed.lock().unwrap().insert(fault);
    }

    pub fn disarm_all(&self) {
        self.armed.lock().unwrap().clear();
    }

    fn check(&self, fault: Fault) -> DbResult<()> {
        if self.armed.lock().unwrap().contains(&fault) {
            return Err(DbError::Internal(format!("injected {fault:?} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn find_stock(&self, stock_id: &str) -> DbResult<Option<Stock>> {
        self.inner.find_stock(stock_id).await
    }

    async fn find_stocks(&self) -> DbResult<Vec<Stock>> {
        self.inner.find_stocks().await
    }

    async fn create_stock(&self, stock: &Stock) -> DbResult<Stock> {
        self.inner.create_stock(stock).await
    }

    async fn save_stock(&self, stock: &Stock) -> DbResult<Stock> {
        self.check(Fault::SaveStock)?;
        self.inner.save_stock(stock).await
    }

    async fn delete_stock(&self, stock_id: &str) -> DbResult<bool> {
        self.inner.delete_stock(stock_id).await
    }

    async fn find_sale(&self, stock_id: &str, sale_id: &str) -> DbResult<Option<Sale>> {
        self.inner.find_sale(stock_id, sale_id).await
    }

    async fn find_sale_by_id(&self, sale_id: &str) -> DbResult<Option<Sale>> {
        self.inner.find_sale_by_id(sale_id).await
    }

    async fn find_sales_for_stock(&self, stock_id: &str) -> DbResult<Vec<Sale>> {
        self.inner.find_sales_for_stock(stock_id).await
    }

    async fn find_sales(&self) -> DbResult<Vec<Sale>> {
        self.inner.find_sales().await
    }

    async fn create_sale(&self, sale: &Sale) -> DbResult<Sale> {
        self.check(Fault::CreateSale)?;
        self.inner.create_sale(sale).await
    }

    async fn save_sale(&self, sale: &Sale) -> DbResult<Sale> {
        self.check(Fault::SaveSale)?;
        self.inner.save_sale(sale).await
    }

    async fn delete_sale(&self, sale_id: &str) -> DbResult<bool> {
        self.inner.delete_sale(sale_id).await
    }

    async fn find_commission_item(&self, id: &str) -> DbResult<Option<CommissionItem>> {
        self.inner.find_commission_item(id).await
    }

    async fn find_commission_items(&self) -> DbResult<Vec<CommissionItem>> {
        self.inner.find_commission_items().await
    }

    async fn create_commission_item(&self, item: &CommissionItem) -> DbResult<CommissionItem> {
        self.inner.create_commission_item(item).await
    }

    async fn save_commission_item(&self, item: &CommissionItem) -> DbResult<CommissionItem> {
        self.check(Fault::SaveCommissionItem)?;
        self.inner.save_commission_item(item).await
    }

    async fn delete_commission_item(&self, id: &str) -> DbResult<bool> {
        self.inner.delete_commission_item(id).await
    }
}
