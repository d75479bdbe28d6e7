//! # Ledger
//!
//! The entry point a routing layer holds: one value wiring the stock, sale,
//! refund and commission services to a shared record store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               Ledger                                    │
//! │                                                                         │
//! │   record_sale ─────► SaleLedger ──────┐                                 │
//! │   process_refund ──► RefundOrchestrator ──► StockLedger ──┐             │
//! │   add_stock_batch ─► StockLedger      │                   │             │
//! │   record_commission_payment ──► CommissionReconciler ◄────┘             │
//! │   reconcile_all ───► repair pass                                        │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                     Arc<dyn RecordStore>  (SQLite by default)           │
//! │                                                                         │
//! │   stock locks:       KeyedLocks keyed by stock ID                       │
//! │   commission locks:  KeyedLocks keyed by commission item ID             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cloning a `Ledger` shares the store and both lock registries, so clones
//! handed to concurrent request handlers still serialise per key.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument};

use pigment_core::{
    CommissionFloor, CommissionItem, Money, NewCommissionItem, NewSale, NewStock, RefundOutcome,
    Sale, SaleReceipt, SalesSummary, Stock, StockSummary,
};
use pigment_db::{Database, RecordStore};

use crate::commission::CommissionReconciler;
use crate::config::LedgerConfig;
use crate::error::LedgerResult;
use crate::locks::KeyedLocks;
use crate::refund::RefundOrchestrator;
use crate::repair::{self, ReconcileReport};
use crate::sale::SaleLedger;
use crate::stock::{StockBatchReport, StockLedger};

#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn RecordStore>,
    stocks: StockLedger,
    sales: SaleLedger,
    refunds: RefundOrchestrator,
    commissions: CommissionReconciler,
}

impl Ledger {
    /// Wires the services over an existing store.
    pub fn new(store: Arc<dyn RecordStore>, floor: CommissionFloor) -> Self {
        let stocks = StockLedger::new(Arc::clone(&store), KeyedLocks::new());
        let commissions = CommissionReconciler::new(Arc::clone(&store), KeyedLocks::new(), floor);
        let sales = SaleLedger::new(
            Arc::clone(&store),
            KeyedLocks::new(),
            stocks.clone(),
            commissions.clone(),
        );
        let refunds = RefundOrchestrator::new(stocks.clone(), sales.clone(), commissions.clone());

        Ledger {
            store,
            stocks,
            sales,
            refunds,
            commissions,
        }
    }

    /// Opens the SQLite store named by `config` and runs migrations.
    pub async fn open(config: &LedgerConfig) -> LedgerResult<Self> {
        let db = Database::new(config.to_db_config()).await?;
        info!(
            path = %config.database.path.display(),
            floor = ?config.commission.floor,
            "Ledger opened"
        );
        Ok(Ledger::new(Arc::new(db), config.commission.floor))
    }

    pub fn stocks(&self) -> &StockLedger {
        &self.stocks
    }

    pub fn sales(&self) -> &SaleLedger {
        &self.sales
    }

    pub fn commissions(&self) -> &CommissionReconciler {
        &self.commissions
    }

    // =========================================================================
    // Sale / Refund
    // =========================================================================

    /// Records a sale. See [`SaleLedger::record_sale`].
    pub async fn record_sale(&self, request: NewSale) -> LedgerResult<SaleReceipt> {
        self.sales.record_sale(request).await
    }

    /// Refunds part of a sale. See [`RefundOrchestrator::process_refund`].
    pub async fn process_refund(
        &self,
        stock_id: &str,
        sale_id: &str,
        qty: i64,
    ) -> LedgerResult<RefundOutcome> {
        self.refunds.process_refund(stock_id, sale_id, qty).await
    }

    // =========================================================================
    // Stock
    // =========================================================================

    pub async fn add_stock_batch(&self, items: Vec<NewStock>) -> LedgerResult<StockBatchReport> {
        self.stocks.add_stock_batch(items).await
    }

    pub async fn get_stock(&self, stock_id: &str) -> LedgerResult<Stock> {
        self.stocks.get(stock_id).await
    }

    pub async fn list_stocks(&self) -> LedgerResult<Vec<Stock>> {
        Ok(self.store.find_stocks().await?)
    }

    pub async fn delete_stock(&self, stock_id: &str) -> LedgerResult<bool> {
        self.stocks.delete_stock(stock_id).await
    }

    // =========================================================================
    // Sales listing
    // =========================================================================

    pub async fn get_sale(&self, stock_id: &str, sale_id: &str) -> LedgerResult<Sale> {
        self.sales.get(stock_id, sale_id).await
    }

    pub async fn list_sales(&self) -> LedgerResult<Vec<Sale>> {
        Ok(self.store.find_sales().await?)
    }

    pub async fn delete_sale(&self, sale_id: &str) -> LedgerResult<bool> {
        self.sales.delete_sale(sale_id).await
    }

    // =========================================================================
    // Commission
    // =========================================================================

    pub async fn create_commission_item(
        &self,
        request: NewCommissionItem,
    ) -> LedgerResult<CommissionItem> {
        self.commissions.create_item(request).await
    }

    pub async fn get_commission_item(&self, id: &str) -> LedgerResult<CommissionItem> {
        self.commissions.get(id).await
    }

    pub async fn list_commission_items(&self) -> LedgerResult<Vec<CommissionItem>> {
        Ok(self.store.find_commission_items().await?)
    }

    pub async fn record_commission_payment(
        &self,
        id: &str,
        amount: Money,
    ) -> LedgerResult<CommissionItem> {
        self.commissions.record_payment(id, amount).await
    }

    pub async fn delete_commission_item(&self, id: &str) -> LedgerResult<bool> {
        self.commissions.delete_item(id).await
    }

    // =========================================================================
    // Maintenance and reporting
    // =========================================================================

    /// Recomputes every stock unit's refund aggregate and reports what was
    /// found. Safe to run while the ledger is serving requests.
    pub async fn reconcile_all(&self) -> LedgerResult<ReconcileReport> {
        repair::reconcile_all(self.store.as_ref(), &self.stocks).await
    }

    /// Totals over every stored sale.
    ///
    /// Sales whose stock unit is gone count with a zero purchase rate.
    #[instrument(skip(self))]
    pub async fn sales_summary(&self) -> LedgerResult<SalesSummary> {
        let rates: HashMap<String, Money> = self
            .store
            .find_stocks()
            .await?
            .into_iter()
            .map(|stock| (stock.stock_id.clone(), stock.rate()))
            .collect();
        let sales = self.store.find_sales().await?;

        Ok(SalesSummary::from_sales(sales.iter().map(|sale| {
            let cost = rates.get(&sale.stock_id).copied().unwrap_or_default();
            (sale, cost)
        })))
    }

    /// Totals over every stored stock unit.
    #[instrument(skip(self))]
    pub async fn stock_summary(&self) -> LedgerResult<StockSummary> {
        let stocks = self.store.find_stocks().await?;
        Ok(StockSummary::from_stocks(&stocks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{memory_store, new_sale, new_stock, Fault, FaultyStore};
    use pigment_core::{CommissionRate, PaidStatus, RefundStatus};

    fn rupees(major: i64) -> Money {
        Money::from_major_minor(major, 0)
    }

    async fn ledger_with_s1() -> Ledger {
        let ledger = Ledger::new(memory_store().await, CommissionFloor::ClampToZero);
        ledger.add_stock_batch(vec![new_stock("S1", 100, 50)]).await.unwrap();
        ledger
    }

    async fn agent(ledger: &Ledger, id: &str, bps: u32) {
        ledger
            .create_commission_item(NewCommissionItem {
                id: Some(id.to_string()),
                agent_name: "Bilal".to_string(),
                percentage: CommissionRate::from_bps(bps),
            })
            .await
            .unwrap();
    }

    // -------------------------------------------------------------------------
    // Scenarios
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_sale_then_oversell() {
        let ledger = ledger_with_s1().await;

        let receipt = ledger.record_sale(new_sale("S1", "SALE1", 20, 80)).await.unwrap();
        assert_eq!(receipt.profit, rupees(600));
        assert_eq!(receipt.remaining, 80);

        let err = ledger.record_sale(new_sale("S1", "SALE2", 90, 80)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientStock);
        assert_eq!(ledger.get_stock("S1").await.unwrap().remaining, 80);
    }

    #[tokio::test]
    async fn test_refund_lifecycle() {
        let ledger = ledger_with_s1().await;
        ledger.record_sale(new_sale("S1", "SALE1", 20, 80)).await.unwrap();

        let outcome = ledger.process_refund("S1", "SALE1", 5).await.unwrap();
        assert_eq!(outcome.refund_amount, rupees(400));
        assert_eq!(outcome.sale_refund_status, RefundStatus::PartiallyRefunded);
        assert_eq!(outcome.stock_refund_status, RefundStatus::PartiallyRefunded);
        assert_eq!(outcome.stock_remaining, 85);
        assert!(!outcome.commission_adjusted);

        let sale = ledger.get_sale("S1", "SALE1").await.unwrap();
        assert_eq!(sale.refund_quantity, 5);
        assert_eq!(sale.profit(), rupees(450));
        let stock = ledger.get_stock("S1").await.unwrap();
        assert_eq!(stock.refund_quantity, 5);

        let err = ledger.process_refund("S1", "SALE1", 16).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RefundExceedsAvailable);
        assert_eq!(ledger.get_stock("S1").await.unwrap().remaining, 85);

        let outcome = ledger.process_refund("S1", "SALE1", 15).await.unwrap();
        assert_eq!(outcome.sale_refund_status, RefundStatus::FullyRefunded);
        assert_eq!(outcome.sale_refund_quantity, 20);
        assert_eq!(outcome.stock_remaining, 100);
        assert!(ledger.get_sale("S1", "SALE1").await.unwrap().profit().is_zero());

        let err = ledger.process_refund("S1", "SALE1", 1).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RefundExceedsAvailable);
    }

    #[tokio::test]
    async fn test_stock_aggregate_spans_sales() {
        let ledger = ledger_with_s1().await;
        ledger.record_sale(new_sale("S1", "SALE1", 60, 80)).await.unwrap();
        ledger.record_sale(new_sale("S1", "SALE2", 40, 80)).await.unwrap();

        ledger.process_refund("S1", "SALE1", 60).await.unwrap();
        let outcome = ledger.process_refund("S1", "SALE2", 40).await.unwrap();
        assert_eq!(outcome.stock_refund_status, RefundStatus::FullyRefunded);
        assert_eq!(ledger.get_stock("S1").await.unwrap().refund_quantity, 100);
    }

    #[tokio::test]
    async fn test_refund_on_missing_records() {
        let ledger = ledger_with_s1().await;
        let err = ledger.process_refund("S1", "NOPE", 1).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        ledger.record_sale(new_sale("S1", "SALE1", 5, 80)).await.unwrap();
        ledger.delete_stock("S1").await.unwrap();
        let err = ledger.process_refund("S1", "SALE1", 1).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(ledger.get_sale("S1", "SALE1").await.unwrap().refund_quantity, 0);

        let err = ledger.process_refund("S1", "SALE1", 0).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_refund_keys_are_trimmed() {
        let ledger = ledger_with_s1().await;
        ledger.record_sale(new_sale("S1", "SALE1", 20, 80)).await.unwrap();

        let outcome = ledger.process_refund(" S1 ", " SALE1 ", 5).await.unwrap();
        assert_eq!(outcome.sale_refund_quantity, 5);
        assert_eq!(outcome.stock_remaining, 85);

        let stock = ledger.get_stock("S1").await.unwrap();
        assert_eq!(stock.refund_quantity, 5);
        assert_eq!(stock.remaining, 85);
    }

    // -------------------------------------------------------------------------
    // Commission
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_commission_follows_sale_and_refund() {
        let ledger = ledger_with_s1().await;
        agent(&ledger, "A1", 1000).await;

        let mut request = new_sale("S1", "SALE1", 20, 80);
        request.agent_item_id = Some("A1".to_string());
        ledger.record_sale(request).await.unwrap();

        let item = ledger.get_commission_item("A1").await.unwrap();
        assert_eq!(item.total_product_sold, 20);
        assert_eq!(item.total_product_amount(), rupees(1600));
        assert_eq!(item.percentage_amount(), rupees(160));

        ledger.record_commission_payment("A1", rupees(160)).await.unwrap();

        let outcome = ledger.process_refund("S1", "SALE1", 5).await.unwrap();
        assert!(outcome.commission_adjusted);

        let item = ledger.get_commission_item("A1").await.unwrap();
        assert_eq!(item.total_product_sold, 15);
        assert_eq!(item.total_product_amount(), rupees(1200));
        assert_eq!(item.percentage_amount(), rupees(120));
        assert_eq!(item.paid_status, PaidStatus::Paid);
    }

    #[tokio::test]
    async fn test_dangling_commission_link_is_skipped() {
        let ledger = ledger_with_s1().await;

        let mut request = new_sale("S1", "SALE1", 20, 80);
        request.agent_item_id = Some("GONE".to_string());
        ledger.record_sale(request).await.unwrap();

        let outcome = ledger.process_refund("S1", "SALE1", 5).await.unwrap();
        assert!(!outcome.commission_adjusted);
        assert_eq!(outcome.stock_remaining, 85);
        assert_eq!(ledger.get_sale("S1", "SALE1").await.unwrap().refund_quantity, 5);
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_sales_never_oversell() {
        let ledger = Ledger::new(memory_store().await, CommissionFloor::ClampToZero);
        ledger.add_stock_batch(vec![new_stock("S1", 10, 50)]).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..25 {
            let ledger = ledger.clone();
            tasks.push(tokio::spawn(async move {
                ledger
                    .record_sale(new_sale("S1", &format!("SALE{i}"), 1, 80))
                    .await
            }));
        }

        let mut sold = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => sold += 1,
                Err(err) => assert_eq!(err.code(), ErrorCode::InsufficientStock),
            }
        }

        assert_eq!(sold, 10);
        assert_eq!(ledger.get_stock("S1").await.unwrap().remaining, 0);
        assert_eq!(ledger.list_sales().await.unwrap().len(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_sale_id_across_stocks_sells_once() {
        let ledger = Ledger::new(memory_store().await, CommissionFloor::ClampToZero);
        ledger
            .add_stock_batch(vec![new_stock("S1", 100, 50), new_stock("S2", 100, 50)])
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for i in 0..20 {
            let ledger = ledger.clone();
            let stock_id = if i % 2 == 0 { "S1" } else { "S2" };
            tasks.push(tokio::spawn(async move {
                ledger.record_sale(new_sale(stock_id, "X", 3, 80)).await
            }));
        }

        let mut recorded = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => recorded += 1,
                Err(err) => assert_eq!(err.code(), ErrorCode::Duplicate),
            }
        }
        assert_eq!(recorded, 1);

        let s1 = ledger.get_stock("S1").await.unwrap().remaining;
        let s2 = ledger.get_stock("S2").await.unwrap().remaining;
        assert_eq!(s1 + s2, 197);
        assert_eq!(ledger.list_sales().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_refunds_respect_bound() {
        let ledger = ledger_with_s1().await;
        ledger.record_sale(new_sale("S1", "SALE1", 20, 80)).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            tasks.push(tokio::spawn(async move {
                ledger.process_refund("S1", "SALE1", 3).await
            }));
        }

        let mut refunded = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                refunded += 3;
            }
        }

        assert_eq!(refunded, 18);
        let sale = ledger.get_sale("S1", "SALE1").await.unwrap();
        assert_eq!(sale.refund_quantity, 18);
        let stock = ledger.get_stock("S1").await.unwrap();
        assert_eq!(stock.refund_quantity, 18);
        assert_eq!(stock.remaining, 98);
    }

    // -------------------------------------------------------------------------
    // Partial failure and repair
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_failed_stock_write_is_healed_by_repair() {
        let store = FaultyStore::in_memory().await;
        let ledger = Ledger::new(store.clone(), CommissionFloor::ClampToZero);
        ledger.add_stock_batch(vec![new_stock("S1", 100, 50)]).await.unwrap();
        ledger.record_sale(new_sale("S1", "SALE1", 20, 80)).await.unwrap();

        store.arm(Fault::SaveStock);
        let err = ledger.process_refund("S1", "SALE1", 5).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::StoreError);
        store.disarm_all();

        // Sale step committed, stock steps did not
        assert_eq!(ledger.get_sale("S1", "SALE1").await.unwrap().refund_quantity, 5);
        let stock = ledger.get_stock("S1").await.unwrap();
        assert_eq!(stock.remaining, 80);
        assert_eq!(stock.refund_quantity, 0);

        let report = ledger.reconcile_all().await.unwrap();
        assert_eq!(report.stocks_checked, 1);
        assert_eq!(report.stocks_changed, 1);

        let stock = ledger.get_stock("S1").await.unwrap();
        assert_eq!(stock.refund_quantity, 5);
        assert_eq!(stock.refund_status, RefundStatus::PartiallyRefunded);

        let again = ledger.reconcile_all().await.unwrap();
        assert_eq!(again.stocks_changed, 0);
    }

    #[tokio::test]
    async fn test_failed_sale_insert_keeps_decrement() {
        let store = FaultyStore::in_memory().await;
        let ledger = Ledger::new(store.clone(), CommissionFloor::ClampToZero);
        ledger.add_stock_batch(vec![new_stock("S1", 100, 50)]).await.unwrap();

        store.arm(Fault::CreateSale);
        assert!(ledger.record_sale(new_sale("S1", "SALE1", 20, 80)).await.is_err());
        store.disarm_all();

        assert_eq!(ledger.get_stock("S1").await.unwrap().remaining, 80);
        assert!(ledger.list_sales().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_commission_write_leaves_refund_committed() {
        let store = FaultyStore::in_memory().await;
        let ledger = Ledger::new(store.clone(), CommissionFloor::ClampToZero);
        ledger.add_stock_batch(vec![new_stock("S1", 100, 50)]).await.unwrap();
        agent(&ledger, "A1", 1000).await;

        let mut request = new_sale("S1", "SALE1", 20, 80);
        request.agent_item_id = Some("A1".to_string());
        ledger.record_sale(request).await.unwrap();

        store.arm(Fault::SaveCommissionItem);
        assert!(ledger.process_refund("S1", "SALE1", 5).await.is_err());
        store.disarm_all();

        let stock = ledger.get_stock("S1").await.unwrap();
        assert_eq!(stock.remaining, 85);
        assert_eq!(stock.refund_quantity, 5);
        assert_eq!(
            ledger.get_commission_item("A1").await.unwrap().total_product_sold,
            20
        );
    }

    // -------------------------------------------------------------------------
    // Summaries
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_summaries() {
        let ledger = ledger_with_s1().await;
        ledger.add_stock_batch(vec![new_stock("S2", 10, 100)]).await.unwrap();

        ledger.record_sale(new_sale("S1", "SALE1", 20, 80)).await.unwrap();
        ledger.record_sale(new_sale("S2", "SALE2", 2, 90)).await.unwrap();
        ledger.process_refund("S1", "SALE1", 5).await.unwrap();

        let sales = ledger.sales_summary().await.unwrap();
        assert_eq!(sales.total_sold, 17);
        assert_eq!(sales.total_revenue, rupees(15 * 80 + 2 * 90));
        assert_eq!(sales.total_profit, rupees(450));
        assert_eq!(sales.total_loss, rupees(20));
        assert_eq!(sales.total_refunded, rupees(400));

        let stocks = ledger.stock_summary().await.unwrap();
        assert_eq!(stocks.total_stock, 110);
        assert_eq!(stocks.total_remaining, 85 + 8);
    }
}
