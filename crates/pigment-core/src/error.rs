//! # Error Types
//!
//! Domain-specific error types for pigment-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pigment-core errors (this file)                                       │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pigment-db errors (separate crate)                                    │
//! │  └── DbError          - Store failures, optimistic conflicts           │
//! │                                                                         │
//! │  pigment-ledger errors                                                 │
//! │  └── LedgerError      - What the routing layer sees (with ErrorCode)   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError ← DbError             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule violations.
///
/// Every variant is recoverable by the caller: it carries enough detail to
/// render a message ("only 80 units available", "max refundable is 15").
#[derive(Debug, Error)]
pub enum CoreError {
    /// No stock unit with this stock ID.
    #[error("Stock not found: {0}")]
    StockNotFound(String),

    /// No sale with this (stock ID, sale ID) pair.
    #[error("Sale not found: {sale_id} (stock {stock_id})")]
    SaleNotFound { stock_id: String, sale_id: String },

    /// No commission item with this ID.
    #[error("Commission item not found: {0}")]
    CommissionItemNotFound(String),

    /// Sale quantity exceeds what the stock unit has left.
    ///
    /// ## User Workflow
    /// ```text
    /// Record sale (qty: 90)
    ///      │
    ///      ▼
    /// Check stock: remaining=80
    ///      │
    ///      ▼
    /// InsufficientStock { stock_id: "S1", available: 80, requested: 90 }
    ///      │
    ///      ▼
    /// UI shows: "Only 80 units available"
    /// ```
    #[error("Insufficient stock for {stock_id}: available {available}, requested {requested}")]
    InsufficientStock {
        stock_id: String,
        available: i64,
        requested: i64,
    },

    /// Refund quantity exceeds the sale's unrefunded balance.
    #[error(
        "Refund of {requested} exceeds refundable quantity for sale {sale_id}: max {max_refundable}"
    )]
    RefundExceedsAvailable {
        sale_id: String,
        max_refundable: i64,
        requested: i64,
    },

    /// Agent payment would exceed the commission owed.
    #[error("Payment of {requested} exceeds outstanding commission {outstanding} on item {item_id}")]
    PaymentExceedsCommission {
        item_id: String,
        outstanding: Money,
        requested: Money,
    },

    /// A stored record violates a derived invariant.
    #[error("Inconsistent record: {0}")]
    Inconsistency(Inconsistency),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Inconsistency
// =============================================================================

/// Which kind of record an inconsistency was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Stock,
    Sale,
    CommissionItem,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Stock => write!(f, "stock"),
            EntityKind::Sale => write!(f, "sale"),
            EntityKind::CommissionItem => write!(f, "commission item"),
        }
    }
}

/// A derived invariant that does not hold on a stored record.
///
/// These are reported and logged, never silently fixed beyond the
/// clamp/recompute rules of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Inconsistency {
    pub entity: EntityKind,
    pub id: String,
    pub detail: String,
}

impl Inconsistency {
    pub fn new(entity: EntityKind, id: impl Into<String>, detail: impl Into<String>) -> Self {
        Inconsistency {
            entity,
            id: id.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.entity, self.id, self.detail)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any record is read, so a validation failure never leaves
/// partial writes behind.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., a rate with three decimals).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate stock ID in an intake batch).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
