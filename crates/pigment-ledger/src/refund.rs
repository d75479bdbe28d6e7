//! # Refund Orchestrator
//!
//! Runs a refund across every record it touches, in a fixed order:
//!
//! ```text
//!   lock stock key
//!     1. sale      refund_quantity += N, profit reduced      (saved)
//!     2. stock     remaining += N, capped at total           (saved)
//!     3. stock     refund aggregate recomputed from sales    (saved if changed)
//!     4. agent     totals -= (N, amount), if the sale is linked
//!   unlock
//! ```
//!
//! The steps are separate writes. If step K fails, steps 1..K-1 stay
//! committed and the error is returned; the repair pass recomputes step 3
//! for every stock unit.

use tracing::{info, instrument};

use pigment_core::validation::{validate_key, validate_quantity};
use pigment_core::RefundOutcome;

use crate::commission::CommissionReconciler;
use crate::error::LedgerResult;
use crate::sale::SaleLedger;
use crate::stock::StockLedger;

#[derive(Clone)]
pub struct RefundOrchestrator {
    stocks: StockLedger,
    sales: SaleLedger,
    commissions: CommissionReconciler,
}

impl RefundOrchestrator {
    pub fn new(stocks: StockLedger, sales: SaleLedger, commissions: CommissionReconciler) -> Self {
        RefundOrchestrator {
            stocks,
            sales,
            commissions,
        }
    }

    /// Refunds `qty` units of a sale.
    ///
    /// ## Errors
    /// - `ValidationError` if `qty ≤ 0`
    /// - `NotFound` if the sale or its stock unit is missing
    /// - `RefundExceedsAvailable` if `qty` exceeds the sale's unrefunded units
    /// - `Conflict` / `StoreError` from any step, with earlier steps committed
    #[instrument(skip(self))]
    pub async fn process_refund(
        &self,
        stock_id: &str,
        sale_id: &str,
        qty: i64,
    ) -> LedgerResult<RefundOutcome> {
        let stock_id = stock_id.trim();
        let sale_id = sale_id.trim();
        validate_key("stock_id", stock_id)?;
        validate_key("sale_id", sale_id)?;
        validate_quantity("refund_quantity", qty)?;

        let _guard = self.stocks.locks().lock(stock_id).await;

        let (sale, refund_amount) = self.sales.refund_sale_locked(stock_id, sale_id, qty).await?;
        self.stocks.restore_stock_locked(stock_id, qty).await?;
        let aggregate = self.stocks.recompute_refund_aggregate_locked(stock_id).await?;

        let commission_adjusted = match sale.agent_item_id.as_deref() {
            Some(agent_item_id) => {
                self.commissions
                    .apply_refund(agent_item_id, qty, refund_amount)
                    .await?
            }
            None => false,
        };

        info!(
            refund_amount = %refund_amount,
            sale_refund_status = %sale.refund_status,
            stock_refund_status = %aggregate.stock.refund_status,
            commission_adjusted,
            "Refund processed"
        );

        Ok(RefundOutcome {
            refund_amount,
            sale_refund_status: sale.refund_status,
            stock_refund_status: aggregate.stock.refund_status,
            sale_refund_quantity: sale.refund_quantity,
            stock_remaining: aggregate.stock.remaining,
            commission_adjusted,
        })
    }
}
