//! # Domain Types
//!
//! Core domain types used throughout Pigment.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │     Stock       │   │      Sale       │   │  CommissionItem     │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  stock_id       │◄──│  stock_id       │   │  id                 │   │
//! │  │  total_product  │   │  sale_id        │──►│  percentage_bps     │   │
//! │  │  remaining      │   │  quantity_sold  │   │  percentage_amount  │   │
//! │  │  rate_cents     │   │  profit_cents   │   │  paid_amount        │   │
//! │  │  refund_qty     │   │  refund_qty     │   │  paid_status        │   │
//! │  └─────────────────┘   │  agent_item_id  │   └─────────────────────┘   │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  Stock ◄── Sale     : linked by stock_id value only (no cascade)       │
//! │  Sale ──► Commission: weak reference, may dangle                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Versioning
//! Every stored entity carries a `version` counter. The store bumps it on
//! each save and rejects saves made against a stale version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Commission Rate
// =============================================================================

/// Commission percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so 7.5% = 750 bps.
/// Agents are assigned percentages like 5, 7.5 or 12.25; bps keeps them
/// exact without floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommissionRate(u32);

impl CommissionRate {
    /// 100% in basis points.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        CommissionRate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        CommissionRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        CommissionRate(0)
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        CommissionRate::zero()
    }
}

// =============================================================================
// Refund Status
// =============================================================================

/// Refund progress of a sale or a stock unit.
///
/// ## State Machine
/// ```text
/// none ──► Partially Refunded ──► Fully Refunded
/// ```
/// Monotonic: there is no "un-refund" operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum RefundStatus {
    #[serde(rename = "none")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "none"))]
    None,
    #[serde(rename = "Partially Refunded")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Partially Refunded"))]
    PartiallyRefunded,
    #[serde(rename = "Fully Refunded")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Fully Refunded"))]
    FullyRefunded,
}

impl RefundStatus {
    /// Derives the status from a refunded count and the count it is bounded by
    /// (`quantity_sold` for a sale, `total_product` for a stock unit).
    ///
    /// ## Example
    /// ```rust
    /// use pigment_core::types::RefundStatus;
    ///
    /// assert_eq!(RefundStatus::derive(0, 20), RefundStatus::None);
    /// assert_eq!(RefundStatus::derive(5, 20), RefundStatus::PartiallyRefunded);
    /// assert_eq!(RefundStatus::derive(20, 20), RefundStatus::FullyRefunded);
    /// ```
    pub fn derive(refunded: i64, bound: i64) -> Self {
        if refunded <= 0 {
            RefundStatus::None
        } else if refunded >= bound {
            RefundStatus::FullyRefunded
        } else {
            RefundStatus::PartiallyRefunded
        }
    }

    /// Label as shown to users and stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::None => "none",
            RefundStatus::PartiallyRefunded => "Partially Refunded",
            RefundStatus::FullyRefunded => "Fully Refunded",
        }
    }
}

impl Default for RefundStatus {
    fn default() -> Self {
        RefundStatus::None
    }
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Paid Status
// =============================================================================

/// Payment progress of an agent's commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum PaidStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaidStatus {
    /// Derives the status by comparing what was paid with what is owed.
    ///
    /// ## Rules
    /// - `paid ≥ owed` → Paid (a zero commission with nothing paid is Paid)
    /// - `0 < paid < owed` → Partial
    /// - otherwise → Unpaid
    pub fn derive(paid: Money, owed: Money) -> Self {
        if paid >= owed {
            PaidStatus::Paid
        } else if paid.is_positive() {
            PaidStatus::Partial
        } else {
            PaidStatus::Unpaid
        }
    }
}

impl Default for PaidStatus {
    fn default() -> Self {
        PaidStatus::Unpaid
    }
}

// =============================================================================
// Commission Floor
// =============================================================================

/// What happens when a refund drives commission totals below zero.
///
/// Only reachable when refunds exceed what was ever attributed to the agent
/// (e.g. after manual data edits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CommissionFloor {
    /// Totals stop at zero; the clamp is reported as an inconsistency.
    #[default]
    ClampToZero,
    /// Totals may go negative.
    AllowNegative,
}

// =============================================================================
// Stock
// =============================================================================

/// One purchased batch of paint, identified by a unique `stock_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Stock {
    /// Business key of the batch.
    pub stock_id: String,

    pub brand_name: String,
    pub item_name: String,
    pub colour_name: String,

    /// Pack size label ("1L", "Gallon", "Drum").
    pub unit: String,

    /// Units originally stocked. Immutable after intake.
    pub total_product: i64,

    /// Units still sellable, always within `0..=total_product`.
    pub remaining: i64,

    /// Purchase rate per unit in minor units. Immutable.
    pub rate_cents: i64,

    /// Sum of refunded units across all sales of this batch, clamped to
    /// `total_product`.
    pub refund_quantity: i64,

    pub refund_status: RefundStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency counter.
    pub version: i64,
}

impl Stock {
    /// Returns the purchase rate as Money.
    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_cents(self.rate_cents)
    }
}

/// One line of a stock intake batch.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewStock {
    #[serde(rename = "stockID")]
    pub stock_id: String,
    pub brand_name: String,
    pub item_name: String,
    #[serde(default)]
    pub colour_name: String,
    /// Pack size label; the original forms call this field `qty`.
    #[serde(rename = "qty", default)]
    pub unit: String,
    pub total_product: i64,
    pub rate: Money,
}

// =============================================================================
// Sale
// =============================================================================

/// One sale transaction against a stock unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    /// Business key of the sale.
    pub sale_id: String,

    /// Stock unit the sale consumed.
    pub stock_id: String,

    /// Descriptive snapshot taken from the sale request.
    pub brand_name: String,
    pub item_name: String,
    pub colour_name: String,
    pub unit: String,

    /// Units sold at creation time. Immutable.
    pub quantity_sold: i64,

    /// Sell rate per unit in minor units. Immutable.
    pub rate_cents: i64,

    /// Profit on the units not yet refunded, never negative.
    pub profit_cents: i64,

    /// Units refunded so far, within `0..=quantity_sold`.
    pub refund_quantity: i64,

    pub refund_status: RefundStatus,

    /// Commission item this sale was attributed to, if any.
    pub agent_item_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency counter.
    pub version: i64,
}

impl Sale {
    /// Returns the sell rate as Money.
    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_cents(self.rate_cents)
    }

    /// Returns the stored profit as Money.
    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }

    /// Units sold and not refunded.
    #[inline]
    pub fn net_sold(&self) -> i64 {
        (self.quantity_sold - self.refund_quantity).max(0)
    }
}

/// A sale request as handed over by the routing layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    #[serde(rename = "stockID")]
    pub stock_id: String,
    #[serde(rename = "saleID")]
    pub sale_id: String,
    pub quantity_sold: i64,
    /// Sell rate per unit.
    pub rate: Money,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub colour_name: String,
    #[serde(rename = "qty", default)]
    pub unit: String,
    #[serde(default)]
    pub agent_item_id: Option<String>,
}

/// Result of a recorded sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale_id: String,
    pub profit: Money,
    /// Stock remaining after the decrement.
    pub remaining: i64,
}

/// Result of a processed refund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RefundOutcome {
    /// `refund_qty × sell rate`.
    pub refund_amount: Money,
    pub sale_refund_status: RefundStatus,
    pub stock_refund_status: RefundStatus,
    pub sale_refund_quantity: i64,
    pub stock_remaining: i64,
    /// Whether a linked commission item was adjusted.
    pub commission_adjusted: bool,
}

// =============================================================================
// Commission Item
// =============================================================================

/// An agent's attributed sales and the commission owed/paid on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CommissionItem {
    pub id: String,
    pub agent_name: String,

    /// Units attributed to the agent (net of refunds).
    pub total_product_sold: i64,

    /// Revenue attributed to the agent (net of refunds).
    pub total_product_amount_cents: i64,

    /// Commission rate, 0..=10000 bps.
    pub percentage_bps: u32,

    /// `total_product_amount × percentage`, rounded to the cent.
    pub percentage_amount_cents: i64,

    /// What the business has paid the agent so far.
    pub paid_amount_cents: i64,

    pub paid_status: PaidStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency counter.
    pub version: i64,
}

impl CommissionItem {
    #[inline]
    pub fn rate(&self) -> CommissionRate {
        CommissionRate::from_bps(self.percentage_bps)
    }

    #[inline]
    pub fn total_product_amount(&self) -> Money {
        Money::from_cents(self.total_product_amount_cents)
    }

    #[inline]
    pub fn percentage_amount(&self) -> Money {
        Money::from_cents(self.percentage_amount_cents)
    }

    #[inline]
    pub fn paid_amount(&self) -> Money {
        Money::from_cents(self.paid_amount_cents)
    }

    /// Commission owed and not yet paid (never negative).
    #[inline]
    pub fn outstanding(&self) -> Money {
        (self.percentage_amount() - self.paid_amount()).floor_zero()
    }
}

/// Agent assignment request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewCommissionItem {
    /// Explicit ID; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub agent_name: String,
    pub percentage: CommissionRate,
}

// =============================================================================
// Unit Tests
// =============================================================================
