//! # pigment-core: Pure Ledger Logic for Pigment
//!
//! This crate holds the rules of the paint shop ledger as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pigment Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Routing layer (outside workspace)               │   │
//! │  │    Stock forms ──► Sale forms ──► Refund ──► Agent payments     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pigment-ledger                               │   │
//! │  │    record_sale, process_refund, per-key locks, repair           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pigment-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  ledger   │  │ validation│  │   │
//! │  │   │   Stock   │  │   Money   │  │  refunds  │  │   rules   │  │   │
//! │  │   │   Sale    │  │ Commission│  │  profit   │  │  checks   │  │   │
//! │  │   │ Commission│  │   Rate    │  │ aggregate │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO LOCKS • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pigment-db (Record Store)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Stock, Sale, CommissionItem, statuses)
//! - [`money`] - Money type with integer arithmetic
//! - [`ledger`] - Sale, refund and commission state transitions
//! - [`summary`] - Listing statistics
//! - [`error`] - Domain error types
//! - [`validation`] - Request validation
//!
//! ## Example Usage
//!
//! ```rust
//! use pigment_core::money::Money;
//! use pigment_core::types::CommissionRate;
//!
//! // Agent earns 7.5% on 1,234.56 of sales
//! let sales = Money::from_cents(123_456);
//! let commission = sales.apply_rate(CommissionRate::from_bps(750));
//!
//! // 92.592 rounds to 92.59
//! assert_eq!(commission.cents(), 9259);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, EntityKind, Inconsistency, ValidationError};
pub use ledger::{sale_profit, AggregateOutcome};
pub use money::Money;
pub use summary::{SalesSummary, StockSummary};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest accepted stock, sale or commission item ID.
pub const MAX_KEY_LENGTH: usize = 64;

/// Longest accepted brand, item, colour or agent name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Largest quantity accepted on a single sale, refund or intake line.
///
/// ## Business Reason
/// Catches typing mistakes (an extra zero on a drum order) long before
/// `rate × qty` could approach the i64 range.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest accepted sell or purchase rate, in cents (100,000,000.00).
///
/// With `MAX_QUANTITY` this keeps `rate × qty` at or below 10^16 cents, so
/// line amounts and the totals built from them stay well inside i64.
pub const MAX_RATE_CENTS: i64 = 10_000_000_000;

/// Largest accepted single payment, in cents: one maximal sale line.
pub const MAX_AMOUNT_CENTS: i64 = MAX_RATE_CENTS * MAX_QUANTITY;
