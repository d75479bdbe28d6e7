//! # Stock Ledger
//!
//! Owns the quantity invariants of stock units:
//! `0 ≤ remaining ≤ total_product` and `0 ≤ refund_quantity ≤ total_product`.
//!
//! Public operations take the stock key lock themselves. The `*_locked`
//! variants are for callers that already hold it (sale and refund flows).

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use pigment_core::validation::{validate_key, validate_new_stock, validate_quantity};
use pigment_core::{CoreError, Inconsistency, NewStock, Stock, ValidationError};
use pigment_db::{DbError, RecordStore};

use crate::error::{ErrorCode, LedgerError, LedgerResult};
use crate::locks::KeyedLocks;

// =============================================================================
// Intake Report
// =============================================================================

/// One intake line that was not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedStock {
    /// Position in the submitted batch.
    pub index: usize,
    pub stock_id: String,
    pub code: ErrorCode,
    pub reason: String,
}

/// Result of a stock intake batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockBatchReport {
    pub created: Vec<String>,
    pub rejected: Vec<RejectedStock>,
}

impl StockBatchReport {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Outcome of a refund aggregate recomputation.
#[derive(Debug, Clone)]
pub struct AggregateResult {
    pub stock: Stock,
    pub changed: bool,
    pub clamped: Option<Inconsistency>,
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// Stock unit operations over a record store.
#[derive(Clone)]
pub struct StockLedger {
    store: Arc<dyn RecordStore>,
    locks: KeyedLocks,
}

impl StockLedger {
    pub fn new(store: Arc<dyn RecordStore>, locks: KeyedLocks) -> Self {
        StockLedger { store, locks }
    }

    /// Lock registry for stock keys, shared with the sale and refund flows.
    pub fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    /// Stores a batch of new stock units.
    ///
    /// Each line stands alone: a rejected line (invalid, repeated within the
    /// batch, or already stored) does not stop the others.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn add_stock_batch(&self, items: Vec<NewStock>) -> LedgerResult<StockBatchReport> {
        let mut report = StockBatchReport::default();
        let mut seen = HashSet::new();
        let now = Utc::now();

        for (index, item) in items.into_iter().enumerate() {
            let stock_id = item.stock_id.trim().to_string();

            if let Err(err) = validate_new_stock(&item) {
                report.reject(index, stock_id, err.into());
                continue;
            }

            if !seen.insert(stock_id.clone()) {
                let err = ValidationError::Duplicate {
                    field: "stock_id".to_string(),
                    value: stock_id.clone(),
                };
                report.reject(index, stock_id, err.into());
                continue;
            }

            let stock = Stock::from_new(item, now);
            match self.store.create_stock(&stock).await {
                Ok(_) => report.created.push(stock_id),
                Err(err @ DbError::UniqueViolation { .. }) => {
                    report.reject(index, stock_id, err.into())
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(
            created = report.created.len(),
            rejected = report.rejected.len(),
            "Stock batch stored"
        );
        Ok(report)
    }

    /// Loads a stock unit or fails with `StockNotFound`.
    pub async fn get(&self, stock_id: &str) -> LedgerResult<Stock> {
        self.store
            .find_stock(stock_id)
            .await?
            .ok_or_else(|| CoreError::StockNotFound(stock_id.to_string()).into())
    }

    /// Takes `qty` units out of a stock unit.
    #[instrument(skip(self))]
    pub async fn decrement_stock(&self, stock_id: &str, qty: i64) -> LedgerResult<Stock> {
        validate_key("stock_id", stock_id)?;
        validate_quantity("quantity", qty)?;
        let _guard = self.locks.lock(stock_id).await;
        self.decrement_stock_locked(stock_id, qty).await
    }

    /// Puts `qty` units back, capped at the stock unit's total.
    #[instrument(skip(self))]
    pub async fn restore_stock(&self, stock_id: &str, qty: i64) -> LedgerResult<Stock> {
        validate_key("stock_id", stock_id)?;
        validate_quantity("quantity", qty)?;
        let _guard = self.locks.lock(stock_id).await;
        self.restore_stock_locked(stock_id, qty).await
    }

    /// Recomputes the stock unit's refund totals from all of its sales.
    #[instrument(skip(self))]
    pub async fn recompute_refund_aggregate(&self, stock_id: &str) -> LedgerResult<AggregateResult> {
        validate_key("stock_id", stock_id)?;
        let _guard = self.locks.lock(stock_id).await;
        self.recompute_refund_aggregate_locked(stock_id).await
    }

    /// Deletes a stock unit. Its sales are kept.
    #[instrument(skip(self))]
    pub async fn delete_stock(&self, stock_id: &str) -> LedgerResult<bool> {
        let _guard = self.locks.lock(stock_id).await;
        let deleted = self.store.delete_stock(stock_id).await?;
        if deleted {
            info!(stock_id = %stock_id, "Stock deleted");
        }
        Ok(deleted)
    }

    // -------------------------------------------------------------------------
    // Lock-held variants
    // -------------------------------------------------------------------------

    pub(crate) async fn decrement_stock_locked(
        &self,
        stock_id: &str,
        qty: i64,
    ) -> LedgerResult<Stock> {
        let mut stock = self.get(stock_id).await?;
        stock.decrement(qty)?;
        let saved = self.store.save_stock(&stock).await?;
        debug!(stock_id = %stock_id, remaining = saved.remaining, "Stock decremented");
        Ok(saved)
    }

    pub(crate) async fn restore_stock_locked(
        &self,
        stock_id: &str,
        qty: i64,
    ) -> LedgerResult<Stock> {
        let mut stock = self.get(stock_id).await?;
        let before = stock.remaining;
        stock.restore(qty);
        if stock.remaining - before < qty {
            warn!(
                stock_id = %stock_id,
                requested = qty,
                restored = stock.remaining - before,
                "Restore capped at total product"
            );
        }
        let saved = self.store.save_stock(&stock).await?;
        debug!(stock_id = %stock_id, remaining = saved.remaining, "Stock restored");
        Ok(saved)
    }

    pub(crate) async fn recompute_refund_aggregate_locked(
        &self,
        stock_id: &str,
    ) -> LedgerResult<AggregateResult> {
        let mut stock = self.get(stock_id).await?;
        let sales = self.store.find_sales_for_stock(stock_id).await?;

        let outcome = stock.apply_refund_aggregate(&sales);
        if let Some(issue) = &outcome.clamped {
            warn!(inconsistency = %issue, "Refund aggregate clamped");
        }

        let stock = if outcome.changed {
            self.store.save_stock(&stock).await?
        } else {
            stock
        };

        debug!(
            stock_id = %stock_id,
            sales = sales.len(),
            refund_quantity = stock.refund_quantity,
            refund_status = %stock.refund_status,
            changed = outcome.changed,
            "Refund aggregate recomputed"
        );

        Ok(AggregateResult {
            stock,
            changed: outcome.changed,
            clamped: outcome.clamped,
        })
    }
}

impl StockBatchReport {
    fn reject(&mut self, index: usize, stock_id: String, err: LedgerError) {
        warn!(index, stock_id = %stock_id, error = %err, "Stock line rejected");
        self.rejected.push(RejectedStock {
            index,
            stock_id,
            code: err.code(),
            reason: err.to_string(),
        });
    }
}
