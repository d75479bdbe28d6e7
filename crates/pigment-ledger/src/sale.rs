//! # Sale Ledger
//!
//! Records sales against stock units and applies refunds to sale records.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_sale(S1, SALE1, qty 20, rate 80.00)                             │
//! │                                                                         │
//! │  lock "S1", then lock "SALE1"                                           │
//! │    │                                                                    │
//! │    ├── SALE1 already stored?        ──► Duplicate                       │
//! │    ├── load S1                      ──► NotFound                        │
//! │    ├── 20 > remaining?              ──► InsufficientStock               │
//! │    ├── S1.remaining -= 20           (saved)                             │
//! │    ├── insert SALE1, profit 600.00  (saved)                             │
//! │    └── agent linked? commission += (20, 1600.00)                        │
//! │  unlock                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step is its own write. A failure after the decrement leaves the
//! stock decremented with no sale; there is no compensating write.
//!
//! Sale IDs are unique across stock units, so the sale key is locked too.
//! Lock order: stock key, sale key, commission item key.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};

use pigment_core::validation::{validate_key, validate_new_sale, validate_quantity};
use pigment_core::{CoreError, Money, NewSale, Sale, SaleReceipt, ValidationError};
use pigment_db::RecordStore;

use crate::commission::CommissionReconciler;
use crate::error::LedgerResult;
use crate::locks::KeyedLocks;
use crate::stock::StockLedger;

/// Sale operations over a record store.
#[derive(Clone)]
pub struct SaleLedger {
    store: Arc<dyn RecordStore>,
    /// Sale key locks, taken after the stock key.
    locks: KeyedLocks,
    stocks: StockLedger,
    commissions: CommissionReconciler,
}

impl SaleLedger {
    pub fn new(
        store: Arc<dyn RecordStore>,
        locks: KeyedLocks,
        stocks: StockLedger,
        commissions: CommissionReconciler,
    ) -> Self {
        SaleLedger {
            store,
            locks,
            stocks,
            commissions,
        }
    }

    /// Records a sale and takes its units out of stock.
    ///
    /// ## Errors
    /// - `ValidationError` for a non-positive quantity or rate
    /// - `Duplicate` if the sale ID is taken
    /// - `NotFound` if the stock unit does not exist
    /// - `InsufficientStock` if the quantity exceeds what is left
    #[instrument(
        skip(self, request),
        fields(stock_id = %request.stock_id, sale_id = %request.sale_id, qty = request.quantity_sold)
    )]
    pub async fn record_sale(&self, request: NewSale) -> LedgerResult<SaleReceipt> {
        validate_new_sale(&request)?;

        let stock_id = request.stock_id.trim().to_string();
        let sale_id = request.sale_id.trim().to_string();
        let qty = request.quantity_sold;

        let _stock_guard = self.stocks.locks().lock(&stock_id).await;
        let _sale_guard = self.locks.lock(&sale_id).await;

        if self.store.find_sale_by_id(&sale_id).await?.is_some() {
            return Err(ValidationError::Duplicate {
                field: "sale_id".to_string(),
                value: sale_id,
            }
            .into());
        }

        let stock = self.stocks.get(&stock_id).await?;
        stock.check_sellable(qty)?;

        let sale = Sale::from_new(request, stock.rate(), Utc::now());
        let stock = self.stocks.decrement_stock_locked(&stock_id, qty).await?;
        let sale = self.store.create_sale(&sale).await?;

        if let Some(agent_item_id) = sale.agent_item_id.as_deref() {
            let amount = sale.rate().multiply_quantity(qty);
            self.commissions.apply_sale(agent_item_id, qty, amount).await?;
        }

        info!(
            sale_id = %sale.sale_id,
            profit = %sale.profit(),
            remaining = stock.remaining,
            "Sale recorded"
        );

        Ok(SaleReceipt {
            profit: sale.profit(),
            remaining: stock.remaining,
            sale_id: sale.sale_id,
        })
    }

    /// Loads a sale or fails with `SaleNotFound`.
    pub async fn get(&self, stock_id: &str, sale_id: &str) -> LedgerResult<Sale> {
        self.store
            .find_sale(stock_id, sale_id)
            .await?
            .ok_or_else(|| {
                CoreError::SaleNotFound {
                    stock_id: stock_id.to_string(),
                    sale_id: sale_id.to_string(),
                }
                .into()
            })
    }

    /// Applies a refund to the sale record only.
    ///
    /// Stock and commission are left alone; use the refund orchestrator for
    /// the full flow.
    #[instrument(skip(self))]
    pub async fn refund_sale(
        &self,
        stock_id: &str,
        sale_id: &str,
        qty: i64,
    ) -> LedgerResult<(Sale, Money)> {
        let stock_id = stock_id.trim();
        let sale_id = sale_id.trim();
        validate_key("stock_id", stock_id)?;
        validate_key("sale_id", sale_id)?;
        validate_quantity("refund_quantity", qty)?;

        let _guard = self.stocks.locks().lock(stock_id).await;
        self.refund_sale_locked(stock_id, sale_id, qty).await
    }

    pub(crate) async fn refund_sale_locked(
        &self,
        stock_id: &str,
        sale_id: &str,
        qty: i64,
    ) -> LedgerResult<(Sale, Money)> {
        let mut sale = self.get(stock_id, sale_id).await?;
        let stock = self.stocks.get(stock_id).await?;

        let amount = sale.apply_refund(qty, stock.rate())?;
        let sale = self.store.save_sale(&sale).await?;

        debug!(
            sale_id = %sale_id,
            refund_quantity = sale.refund_quantity,
            refund_status = %sale.refund_status,
            profit = %sale.profit(),
            "Sale refunded"
        );
        Ok((sale, amount))
    }

    /// Deletes a sale. Stock and commission totals are not touched.
    #[instrument(skip(self))]
    pub async fn delete_sale(&self, sale_id: &str) -> LedgerResult<bool> {
        let Some(sale) = self.store.find_sale_by_id(sale_id).await? else {
            return Ok(false);
        };

        let _stock_guard = self.stocks.locks().lock(&sale.stock_id).await;
        let _sale_guard = self.locks.lock(sale_id).await;
        let deleted = self.store.delete_sale(sale_id).await?;
        if deleted {
            info!(sale_id = %sale_id, stock_id = %sale.stock_id, "Sale deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::locks::KeyedLocks;
    use crate::testing::{memory_store, new_sale, new_stock};
    use pigment_core::{CommissionFloor, RefundStatus};

    fn rupees(major: i64) -> Money {
        Money::from_major_minor(major, 0)
    }

    async fn ledgers() -> (StockLedger, SaleLedger) {
        let store = memory_store().await;
        let stocks = StockLedger::new(store.clone(), KeyedLocks::new());
        let commissions =
            CommissionReconciler::new(store.clone(), KeyedLocks::new(), CommissionFloor::default());
        let sales = SaleLedger::new(store, KeyedLocks::new(), stocks.clone(), commissions);
        stocks.add_stock_batch(vec![new_stock("S1", 100, 50)]).await.unwrap();
        (stocks, sales)
    }

    #[tokio::test]
    async fn test_record_sale() {
        let (stocks, sales) = ledgers().await;

        let receipt = sales.record_sale(new_sale("S1", "SALE1", 20, 80)).await.unwrap();
        assert_eq!(receipt.profit, rupees(600));
        assert_eq!(receipt.remaining, 80);
        assert_eq!(stocks.get("S1").await.unwrap().remaining, 80);

        let sale = sales.get("S1", "SALE1").await.unwrap();
        assert_eq!(sale.refund_quantity, 0);
        assert_eq!(sale.refund_status, RefundStatus::None);
    }

    #[tokio::test]
    async fn test_record_sale_rejections_leave_stock_alone() {
        let (stocks, sales) = ledgers().await;
        sales.record_sale(new_sale("S1", "SALE1", 20, 80)).await.unwrap();

        let err = sales.record_sale(new_sale("S1", "SALE2", 90, 80)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientStock);

        let err = sales.record_sale(new_sale("S1", "SALE1", 1, 80)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Duplicate);

        let err = sales.record_sale(new_sale("S1", "SALE3", 0, 80)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = sales.record_sale(new_sale("S1", "SALE4", 1, 0)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = sales.record_sale(new_sale("S9", "SALE5", 1, 80)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        assert_eq!(stocks.get("S1").await.unwrap().remaining, 80);
    }

    #[tokio::test]
    async fn test_refund_on_loss_making_sale_adds_back_the_loss() {
        let (_, sales) = ledgers().await;
        let receipt = sales.record_sale(new_sale("S1", "SALE1", 10, 40)).await.unwrap();
        assert!(receipt.profit.is_zero());

        // max(0, 0 - (40 - 50) × 5)
        let (sale, amount) = sales.refund_sale("S1", "SALE1", 5).await.unwrap();
        assert_eq!(amount, rupees(200));
        assert_eq!(sale.profit(), rupees(50));
    }

    #[tokio::test]
    async fn test_oversized_rate_is_rejected_before_stock_moves() {
        let (stocks, sales) = ledgers().await;
        stocks
            .add_stock_batch(vec![new_stock("BULK", 1_000_000, 0)])
            .await
            .unwrap();

        let mut request = new_sale("BULK", "HUGE", 1_000_000, 1);
        request.rate = "99999999999999.99".parse().unwrap();
        let err = sales.record_sale(request).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        assert_eq!(stocks.get("BULK").await.unwrap().remaining, 1_000_000);
        assert!(sales.get("BULK", "HUGE").await.is_err());
    }

    #[tokio::test]
    async fn test_keys_are_trimmed() {
        let (stocks, sales) = ledgers().await;
        let receipt = sales.record_sale(new_sale(" S1 ", " SALE1 ", 20, 80)).await.unwrap();
        assert_eq!(receipt.sale_id, "SALE1");

        let (sale, _) = sales.refund_sale(" S1 ", " SALE1 ", 5).await.unwrap();
        assert_eq!(sale.refund_quantity, 5);
        assert_eq!(stocks.get("S1").await.unwrap().remaining, 80);
    }

    #[tokio::test]
    async fn test_refund_sale_only_touches_the_sale() {
        let (stocks, sales) = ledgers().await;
        sales.record_sale(new_sale("S1", "SALE1", 20, 80)).await.unwrap();

        let (sale, amount) = sales.refund_sale("S1", "SALE1", 5).await.unwrap();
        assert_eq!(amount, rupees(400));
        assert_eq!(sale.profit(), rupees(450));
        assert_eq!(sale.refund_status, RefundStatus::PartiallyRefunded);
        assert_eq!(stocks.get("S1").await.unwrap().remaining, 80);

        let err = sales.refund_sale("S1", "SALE1", 16).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RefundExceedsAvailable);

        let err = sales.refund_sale("S2", "SALE1", 1).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_delete_sale() {
        let (_, sales) = ledgers().await;
        sales.record_sale(new_sale("S1", "SALE1", 1, 80)).await.unwrap();

        assert!(sales.delete_sale("SALE1").await.unwrap());
        assert!(!sales.delete_sale("SALE1").await.unwrap());
    }
}
