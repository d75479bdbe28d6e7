//! # Repair Pass
//!
//! Multi-record flows are not transactional, so a failure mid-flow can leave
//! a stock unit's refund aggregate behind its sales. The aggregate is a pure
//! function of the sales, so recomputing it for every stock unit is the fix.
//!
//! ```text
//! for each stock unit (under its key lock):
//!     check each sale's bounds           → inconsistencies
//!     recompute refund aggregate         → changed? clamped?
//!     check the stock's bounds           → inconsistencies
//! then: sales whose stock unit is gone   → checked, reported as orphans
//! ```
//!
//! Nothing beyond the aggregate is rewritten: a `remaining` out of bounds is
//! reported, not guessed at.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, instrument, warn};

use pigment_core::{EntityKind, Inconsistency};
use pigment_db::RecordStore;

use crate::error::LedgerResult;
use crate::stock::StockLedger;

/// What a repair pass found and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub stocks_checked: usize,
    /// Stock units whose refund aggregate was rewritten.
    pub stocks_changed: usize,
    pub sales_checked: usize,
    pub inconsistencies: Vec<Inconsistency>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.stocks_changed == 0 && self.inconsistencies.is_empty()
    }

    fn report(&mut self, issue: Inconsistency) {
        warn!(inconsistency = %issue, "Inconsistency found");
        self.inconsistencies.push(issue);
    }
}

/// Recomputes every stock unit's refund aggregate and checks record bounds.
#[instrument(skip_all)]
pub async fn reconcile_all(
    store: &dyn RecordStore,
    stocks: &StockLedger,
) -> LedgerResult<ReconcileReport> {
    let mut report = ReconcileReport::default();
    let mut seen = HashSet::new();

    for stock in store.find_stocks().await? {
        let stock_id = stock.stock_id;
        let _guard = stocks.locks().lock(&stock_id).await;

        for sale in store.find_sales_for_stock(&stock_id).await? {
            report.sales_checked += 1;
            for issue in sale.check_invariants() {
                report.report(issue);
            }
        }

        let aggregate = stocks.recompute_refund_aggregate_locked(&stock_id).await?;
        report.stocks_checked += 1;
        if aggregate.changed {
            report.stocks_changed += 1;
        }
        if let Some(issue) = aggregate.clamped {
            report.report(issue);
        }
        for issue in aggregate.stock.check_invariants() {
            report.report(issue);
        }

        seen.insert(stock_id);
    }

    for sale in store.find_sales().await? {
        if seen.contains(&sale.stock_id) {
            continue;
        }
        report.sales_checked += 1;
        for issue in sale.check_invariants() {
            report.report(issue);
        }
        report.report(Inconsistency::new(
            EntityKind::Sale,
            &sale.sale_id,
            format!("stock unit {} does not exist", sale.stock_id),
        ));
    }

    info!(
        stocks_checked = report.stocks_checked,
        stocks_changed = report.stocks_changed,
        sales_checked = report.sales_checked,
        inconsistencies = report.inconsistencies.len(),
        "Repair pass complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::KeyedLocks;
    use crate::testing::{memory_store, new_stock};
    use chrono::Utc;
    use pigment_core::{Money, RefundStatus, Sale};

    fn sale(stock_id: &str, sale_id: &str, qty: i64, refunded: i64) -> Sale {
        let now = Utc::now();
        Sale {
            sale_id: sale_id.to_string(),
            stock_id: stock_id.to_string(),
            brand_name: String::new(),
            item_name: String::new(),
            colour_name: String::new(),
            unit: String::new(),
            quantity_sold: qty,
            rate_cents: 8000,
            profit_cents: 0,
            refund_quantity: refunded,
            refund_status: RefundStatus::derive(refunded, qty),
            agent_item_id: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_repair_recomputes_and_reports() {
        let store = memory_store().await;
        let stocks = StockLedger::new(store.clone(), KeyedLocks::new());
        stocks
            .add_stock_batch(vec![new_stock("S1", 10, 50), new_stock("S2", 10, 50)])
            .await
            .unwrap();

        // Written directly, bypassing the ledger: S1's aggregate is stale and
        // its refunds overshoot the stock total.
        store.create_sale(&sale("S1", "A", 8, 8)).await.unwrap();
        store.create_sale(&sale("S1", "B", 6, 6)).await.unwrap();
        store.create_sale(&sale("S9", "C", 2, 0)).await.unwrap();

        let report = reconcile_all(store.as_ref(), &stocks).await.unwrap();
        assert_eq!(report.stocks_checked, 2);
        assert_eq!(report.stocks_changed, 1);
        assert_eq!(report.sales_checked, 3);
        assert!(!report.is_clean());

        let entities: Vec<(EntityKind, &str)> = report
            .inconsistencies
            .iter()
            .map(|i| (i.entity, i.id.as_str()))
            .collect();
        assert_eq!(entities, vec![(EntityKind::Stock, "S1"), (EntityKind::Sale, "C")]);

        let s1 = stocks.get("S1").await.unwrap();
        assert_eq!(s1.refund_quantity, 10);
        assert_eq!(s1.refund_status, RefundStatus::FullyRefunded);

        let again = reconcile_all(store.as_ref(), &stocks).await.unwrap();
        assert_eq!(again.stocks_changed, 0);
        assert_eq!(stocks.get("S1").await.unwrap().rate(), Money::from_major_minor(50, 0));
    }
}
