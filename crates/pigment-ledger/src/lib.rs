//! # pigment-ledger: Sale, Refund and Commission Flows
//!
//! Runs the ledger operations that span more than one record: a sale moves
//! stock and may credit an agent; a refund touches the sale, its stock unit
//! and possibly the agent's commission item.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Routing layer (HTTP handlers, CLI)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 pigment-ledger (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │  Ledger ─► SaleLedger / RefundOrchestrator / StockLedger /      │   │
//! │  │            CommissionReconciler        KeyedLocks (per key)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                          │                                      │
//! │       ▼                          ▼                                      │
//! │  pigment-core (rules)       pigment-db (RecordStore over SQLite)        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency Model
//! - Every operation holds the lock of the stock key it touches, then the
//!   sale key when it creates or deletes a sale, then (if any) the
//!   commission item key. Different stock units run in parallel.
//! - Steps are persisted one at a time in a fixed order. A failure returns
//!   the error and leaves earlier steps committed.
//! - [`Ledger::reconcile_all`] recomputes every derived stock aggregate.
//!
//! ## Usage
//! ```rust,ignore
//! use pigment_ledger::{Ledger, LedgerConfig};
//!
//! let ledger = Ledger::open(&LedgerConfig::load(None)?).await?;
//! let receipt = ledger.record_sale(request).await?;
//! let outcome = ledger.process_refund("S1", &receipt.sale_id, 5).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commission;
pub mod config;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod refund;
pub mod repair;
pub mod sale;
pub mod stock;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use commission::CommissionReconciler;
pub use config::{ConfigError, LedgerConfig};
pub use error::{ErrorCode, LedgerError, LedgerResult};
pub use ledger::Ledger;
pub use locks::KeyedLocks;
pub use refund::RefundOrchestrator;
pub use repair::ReconcileReport;
pub use sale::SaleLedger;
pub use stock::{AggregateResult, RejectedStock, StockBatchReport, StockLedger};
