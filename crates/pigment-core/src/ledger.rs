//! # Ledger Rules
//!
//! Pure state transitions for stock units, sales and commission items.
//! Every function here mutates an in-memory record and returns; the caller
//! (pigment-ledger) decides when to load and persist.
//!
//! ## Refund Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Refund of N units                               │
//! │                                                                         │
//! │  1. Sale::apply_refund(N, cost)                                         │
//! │     refund_quantity += N, profit = max(0, profit - margin × N)          │
//! │                              │                                          │
//! │  2. Stock::restore(N)        ▼                                          │
//! │     remaining = min(remaining + N, total_product)                       │
//! │                              │                                          │
//! │  3. Stock::apply_refund_aggregate(all sales of the stock)               │
//! │     refund_quantity = min(Σ sale.refund_quantity, total_product)        │
//! │                              │                                          │
//! │  4. CommissionItem::apply_delta(-N, -amount)   (if the sale is linked)  │
//! │     totals shrink, percentage_amount and paid_status re-derived         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding
//! Rates are exact cents and quantities are integers, so `rate × qty` never
//! rounds. Only `CommissionRate` math rounds (half away from zero).

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, EntityKind, Inconsistency, ValidationError};
use crate::money::Money;
use crate::types::{
    CommissionFloor, CommissionItem, CommissionRate, NewSale, NewStock, PaidStatus, RefundStatus,
    Sale, Stock,
};

// =============================================================================
// Profit
// =============================================================================

/// Profit on `qty` units sold at `sell` against a purchase rate of `cost`.
///
/// A loss-making margin yields zero profit; losses are surfaced by
/// [`crate::summary::SalesSummary`] instead.
///
/// ## Example
/// ```rust
/// use pigment_core::ledger::sale_profit;
/// use pigment_core::Money;
///
/// let profit = sale_profit(Money::from_major_minor(80, 0), Money::from_major_minor(50, 0), 20);
/// assert_eq!(profit.to_string(), "600.00");
///
/// let loss = sale_profit(Money::from_major_minor(40, 0), Money::from_major_minor(50, 0), 20);
/// assert!(loss.is_zero());
/// ```
#[inline]
pub fn sale_profit(sell: Money, cost: Money, qty: i64) -> Money {
    (sell - cost).floor_zero().multiply_quantity(qty)
}

// =============================================================================
// Stock
// =============================================================================

/// Outcome of recomputing a stock unit's refund aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOutcome {
    /// Whether `refund_quantity` or `refund_status` changed.
    pub changed: bool,
    /// Set when the raw sum exceeded `total_product` and was clamped.
    pub clamped: Option<Inconsistency>,
}

impl Stock {
    /// Builds a fresh stock unit from an intake line.
    pub fn from_new(new: NewStock, now: DateTime<Utc>) -> Self {
        Stock {
            stock_id: new.stock_id.trim().to_string(),
            brand_name: new.brand_name,
            item_name: new.item_name,
            colour_name: new.colour_name,
            unit: new.unit,
            total_product: new.total_product,
            remaining: new.total_product,
            rate_cents: new.rate.cents(),
            refund_quantity: 0,
            refund_status: RefundStatus::None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Fails with `InsufficientStock` when `qty` exceeds what is left.
    pub fn check_sellable(&self, qty: i64) -> CoreResult<()> {
        if qty > self.remaining {
            return Err(CoreError::InsufficientStock {
                stock_id: self.stock_id.clone(),
                available: self.remaining,
                requested: qty,
            });
        }
        Ok(())
    }

    /// Takes `qty` units out of the stock unit.
    pub fn decrement(&mut self, qty: i64) -> CoreResult<()> {
        self.check_sellable(qty)?;
        self.remaining -= qty;
        Ok(())
    }

    /// Puts `qty` units back, never above `total_product`.
    pub fn restore(&mut self, qty: i64) {
        self.remaining = (self.remaining + qty).min(self.total_product).max(0);
    }

    /// Recomputes `refund_quantity` and `refund_status` from the sales of
    /// this stock unit.
    ///
    /// Sales with a different `stock_id` are ignored. Applying the same sales
    /// twice yields the same record.
    pub fn apply_refund_aggregate(&mut self, sales: &[Sale]) -> AggregateOutcome {
        let raw: i64 = sales
            .iter()
            .filter(|s| s.stock_id == self.stock_id)
            .map(|s| s.refund_quantity.max(0))
            .sum();

        let clamped = if raw > self.total_product {
            Some(Inconsistency::new(
                EntityKind::Stock,
                &self.stock_id,
                format!(
                    "sale refunds sum to {} but total product is {}",
                    raw, self.total_product
                ),
            ))
        } else {
            None
        };

        let quantity = raw.min(self.total_product);
        let status = RefundStatus::derive(quantity, self.total_product);
        let changed = quantity != self.refund_quantity || status != self.refund_status;

        self.refund_quantity = quantity;
        self.refund_status = status;

        AggregateOutcome { changed, clamped }
    }

    /// Lists every quantity invariant this record violates.
    pub fn check_invariants(&self) -> Vec<Inconsistency> {
        let mut issues = Vec::new();
        if self.total_product < 0 {
            issues.push(self.issue(format!("total product {} is negative", self.total_product)));
        }
        if self.remaining < 0 || self.remaining > self.total_product {
            issues.push(self.issue(format!(
                "remaining {} outside 0..={}",
                self.remaining, self.total_product
            )));
        }
        if self.refund_quantity < 0 || self.refund_quantity > self.total_product {
            issues.push(self.issue(format!(
                "refund quantity {} outside 0..={}",
                self.refund_quantity, self.total_product
            )));
        }
        issues
    }

    fn issue(&self, detail: String) -> Inconsistency {
        Inconsistency::new(EntityKind::Stock, &self.stock_id, detail)
    }
}

// =============================================================================
// Sale
// =============================================================================

impl Sale {
    /// Builds a sale record for a request already checked against its stock.
    pub fn from_new(new: NewSale, purchase_rate: Money, now: DateTime<Utc>) -> Self {
        let profit = sale_profit(new.rate, purchase_rate, new.quantity_sold);
        Sale {
            sale_id: new.sale_id.trim().to_string(),
            stock_id: new.stock_id.trim().to_string(),
            brand_name: new.brand_name,
            item_name: new.item_name,
            colour_name: new.colour_name,
            unit: new.unit,
            quantity_sold: new.quantity_sold,
            rate_cents: new.rate.cents(),
            profit_cents: profit.cents(),
            refund_quantity: 0,
            refund_status: RefundStatus::None,
            agent_item_id: new
                .agent_item_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Units that can still be refunded.
    ///
    /// A stored refund count above `quantity_sold` is reported rather than
    /// treated as zero.
    pub fn max_refundable(&self) -> CoreResult<i64> {
        if self.refund_quantity < 0 || self.refund_quantity > self.quantity_sold {
            return Err(CoreError::Inconsistency(Inconsistency::new(
                EntityKind::Sale,
                &self.sale_id,
                format!(
                    "refund quantity {} outside 0..={}",
                    self.refund_quantity, self.quantity_sold
                ),
            )));
        }
        Ok(self.quantity_sold - self.refund_quantity)
    }

    /// Refunds `qty` units and returns the refund amount (`qty × sell rate`).
    ///
    /// `purchase_rate` is the rate of the stock unit this sale consumed.
    ///
    /// ## Errors
    /// - `Validation` if `qty ≤ 0`
    /// - `RefundExceedsAvailable` if `qty` exceeds [`Sale::max_refundable`]
    /// - `Inconsistency` if the stored record is already out of bounds
    pub fn apply_refund(&mut self, qty: i64, purchase_rate: Money) -> CoreResult<Money> {
        if qty <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "refund_quantity".to_string(),
            }
            .into());
        }

        let max_refundable = self.max_refundable()?;
        if qty > max_refundable {
            return Err(CoreError::RefundExceedsAvailable {
                sale_id: self.sale_id.clone(),
                max_refundable,
                requested: qty,
            });
        }

        // Raw margin: a loss-making line gives a negative delta
        let delta = (self.rate() - purchase_rate).multiply_quantity(qty);
        self.profit_cents = (self.profit() - delta).floor_zero().cents();
        self.refund_quantity += qty;
        self.refund_status = RefundStatus::derive(self.refund_quantity, self.quantity_sold);

        Ok(self.rate().multiply_quantity(qty))
    }

    /// Lists every bound this record violates.
    pub fn check_invariants(&self) -> Vec<Inconsistency> {
        let mut issues = Vec::new();
        if self.quantity_sold <= 0 {
            issues.push(self.issue(format!("quantity sold {} is not positive", self.quantity_sold)));
        }
        if self.refund_quantity < 0 || self.refund_quantity > self.quantity_sold {
            issues.push(self.issue(format!(
                "refund quantity {} outside 0..={}",
                self.refund_quantity, self.quantity_sold
            )));
        }
        if self.profit_cents < 0 {
            issues.push(self.issue(format!("profit {} is negative", self.profit())));
        }
        issues
    }

    fn issue(&self, detail: String) -> Inconsistency {
        Inconsistency::new(EntityKind::Sale, &self.sale_id, detail)
    }
}

// =============================================================================
// Commission Item
// =============================================================================

impl CommissionItem {
    /// Creates an agent's commission item with zero totals, marked unpaid.
    pub fn new(
        id: impl Into<String>,
        agent_name: impl Into<String>,
        rate: CommissionRate,
        now: DateTime<Utc>,
    ) -> Self {
        CommissionItem {
            id: id.into(),
            agent_name: agent_name.into(),
            total_product_sold: 0,
            total_product_amount_cents: 0,
            percentage_bps: rate.bps(),
            percentage_amount_cents: 0,
            paid_amount_cents: 0,
            paid_status: PaidStatus::Unpaid,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Adds a signed delta to the attributed totals, then recomputes.
    ///
    /// Sales pass positive deltas, refunds negative ones. Under
    /// [`CommissionFloor::ClampToZero`] totals stop at zero and the clamp is
    /// returned so the caller can log it.
    pub fn apply_delta(
        &mut self,
        qty_delta: i64,
        amount_delta: Money,
        floor: CommissionFloor,
    ) -> Option<Inconsistency> {
        let sold = self.total_product_sold + qty_delta;
        let amount = self.total_product_amount() + amount_delta;

        let clamped = match floor {
            CommissionFloor::AllowNegative => None,
            CommissionFloor::ClampToZero if sold < 0 || amount.is_negative() => {
                Some(Inconsistency::new(
                    EntityKind::CommissionItem,
                    &self.id,
                    format!("totals fell below zero (sold {}, amount {}), clamped", sold, amount),
                ))
            }
            CommissionFloor::ClampToZero => None,
        };

        if clamped.is_some() {
            self.total_product_sold = sold.max(0);
            self.total_product_amount_cents = amount.floor_zero().cents();
        } else {
            self.total_product_sold = sold;
            self.total_product_amount_cents = amount.cents();
        }

        self.recompute();
        clamped
    }

    /// Re-derives `percentage_amount` and `paid_status` from the totals.
    pub fn recompute(&mut self) {
        let owed = self.total_product_amount().apply_rate(self.rate());
        self.percentage_amount_cents = owed.cents();
        self.paid_status = PaidStatus::derive(self.paid_amount(), owed);
    }

    /// Records a payment to the agent.
    ///
    /// ## Errors
    /// - `Validation` if `amount ≤ 0`
    /// - `PaymentExceedsCommission` if the payment would overpay the agent
    pub fn record_payment(&mut self, amount: Money) -> CoreResult<()> {
        if !amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "amount".to_string(),
            }
            .into());
        }

        if self.paid_amount() + amount > self.percentage_amount() {
            return Err(CoreError::PaymentExceedsCommission {
                item_id: self.id.clone(),
                outstanding: self.outstanding(),
                requested: amount,
            });
        }

        self.paid_amount_cents += amount.cents();
        self.paid_status = PaidStatus::derive(self.paid_amount(), self.percentage_amount());
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
