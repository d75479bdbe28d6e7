//! # Commission Reconciler
//!
//! Keeps an agent's commission item in step with the sales attributed to it.
//!
//! ```text
//!  sale  (qty, qty × rate) ──► apply_sale   ──┐
//!                                             ├──► totals ± delta
//!  refund (qty, amount)    ──► apply_refund ──┘        │
//!                                                      ▼
//!                                 percentage_amount = amount × rate
//!                                 paid_status       = f(paid, owed)
//! ```
//!
//! A sale's `agent_item_id` is a weak link: when the item is gone the
//! adjustment is skipped with a warning instead of failing the sale or
//! refund that triggered it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use pigment_core::validation::{validate_key, validate_new_commission_item, validate_payment_amount};
use pigment_core::{CommissionFloor, CommissionItem, CoreError, Money, NewCommissionItem};
use pigment_db::RecordStore;

use crate::error::LedgerResult;
use crate::locks::KeyedLocks;

/// Commission item operations over a record store.
#[derive(Clone)]
pub struct CommissionReconciler {
    store: Arc<dyn RecordStore>,
    locks: KeyedLocks,
    floor: CommissionFloor,
}

impl CommissionReconciler {
    pub fn new(store: Arc<dyn RecordStore>, locks: KeyedLocks, floor: CommissionFloor) -> Self {
        CommissionReconciler {
            store,
            locks,
            floor,
        }
    }

    pub fn floor(&self) -> CommissionFloor {
        self.floor
    }

    /// Creates an agent's commission item with zero totals.
    ///
    /// A UUID is generated when the request carries no ID.
    #[instrument(skip(self, request), fields(agent = %request.agent_name))]
    pub async fn create_item(&self, request: NewCommissionItem) -> LedgerResult<CommissionItem> {
        validate_new_commission_item(&request)?;

        let id = request
            .id
            .map(|id| id.trim().to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let item = CommissionItem::new(
            id,
            request.agent_name.trim(),
            request.percentage,
            Utc::now(),
        );

        let item = self.store.create_commission_item(&item).await?;
        info!(item_id = %item.id, bps = item.percentage_bps, "Commission item created");
        Ok(item)
    }

    /// Loads a commission item or fails with `CommissionItemNotFound`.
    pub async fn get(&self, id: &str) -> LedgerResult<CommissionItem> {
        self.store
            .find_commission_item(id)
            .await?
            .ok_or_else(|| CoreError::CommissionItemNotFound(id.to_string()).into())
    }

    /// Adds a sale to the agent's totals.
    ///
    /// Returns `false` when the item does not exist.
    pub async fn apply_sale(&self, id: &str, qty: i64, amount: Money) -> LedgerResult<bool> {
        self.apply_delta(id, qty, amount).await
    }

    /// Removes refunded units and revenue from the agent's totals.
    ///
    /// Returns `false` when the item does not exist.
    pub async fn apply_refund(&self, id: &str, qty: i64, amount: Money) -> LedgerResult<bool> {
        self.apply_delta(id, -qty, -amount).await
    }

    #[instrument(skip(self))]
    async fn apply_delta(&self, id: &str, qty_delta: i64, amount_delta: Money) -> LedgerResult<bool> {
        let _guard = self.locks.lock(id).await;

        let Some(mut item) = self.store.find_commission_item(id).await? else {
            warn!(item_id = %id, "Commission item not found, adjustment skipped");
            return Ok(false);
        };

        if let Some(issue) = item.apply_delta(qty_delta, amount_delta, self.floor) {
            warn!(inconsistency = %issue, "Commission totals clamped");
        }

        let item = self.store.save_commission_item(&item).await?;
        info!(
            item_id = %item.id,
            total_product_sold = item.total_product_sold,
            percentage_amount = %item.percentage_amount(),
            paid_status = ?item.paid_status,
            "Commission item reconciled"
        );
        Ok(true)
    }

    /// Records a payment to the agent.
    #[instrument(skip(self))]
    pub async fn record_payment(&self, id: &str, amount: Money) -> LedgerResult<CommissionItem> {
        validate_key("id", id)?;
        validate_payment_amount(amount)?;

        let _guard = self.locks.lock(id).await;
        let mut item = self.get(id).await?;
        item.record_payment(amount)?;

        let item = self.store.save_commission_item(&item).await?;
        info!(
            item_id = %item.id,
            paid = %item.paid_amount(),
            outstanding = %item.outstanding(),
            "Commission payment recorded"
        );
        Ok(item)
    }

    /// Deletes a commission item. Sales linked to it keep the dangling ID.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: &str) -> LedgerResult<bool> {
        let _guard = self.locks.lock(id).await;
        Ok(self.store.delete_commission_item(id).await?)
    }
}
