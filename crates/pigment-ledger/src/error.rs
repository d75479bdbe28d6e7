//! # Ledger Error Type
//!
//! Unified error type returned by every ledger operation.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Pigment                                │
//! │                                                                         │
//! │  Routing layer                Ledger                                    │
//! │  ─────────────                ──────                                    │
//! │                                                                         │
//! │  ledger.process_refund(..)                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Result<T, LedgerError>                                          │  │
//! │  │         │                                                        │  │
//! │  │  Rule violated?  ─── CoreError::RefundExceedsAvailable ──┐       │  │
//! │  │         │                                                │       │  │
//! │  │  Store failed?   ─── DbError::Conflict ──────────────────┤       │  │
//! │  │         │                                                ▼       │  │
//! │  │         │                                          LedgerError   │  │
//! │  │         ▼                                          .code()       │  │
//! │  │  Success                                           .is_retryable │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  match err.code() {                                                     │
//! │      ErrorCode::Conflict => retry the whole operation                   │
//! │      ErrorCode::RefundExceedsAvailable => "max refundable is 15"        │
//! │      ..                                                                 │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pigment_core::{CoreError, ValidationError};
use pigment_db::DbError;

/// Errors returned by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A ledger rule rejected the request.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The record store failed.
    #[error(transparent)]
    Store(#[from] DbError),
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Core(CoreError::Validation(err))
    }
}

/// Machine-readable error codes.
///
/// ## Serialization
/// ```json
/// { "code": "REFUND_EXCEEDS_AVAILABLE", "message": "Refund of 16 exceeds ..." }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed
    ValidationError,

    /// Stock unit, sale or commission item missing
    NotFound,

    /// Key already taken
    Duplicate,

    /// Sale quantity above remaining stock
    InsufficientStock,

    /// Refund quantity above the sale's unrefunded balance
    RefundExceedsAvailable,

    /// Agent payment above outstanding commission
    PaymentExceedsCommission,

    /// Stored record violates a derived invariant
    Inconsistency,

    /// Concurrent write detected, retry the operation
    Conflict,

    /// Store could not be reached or failed internally
    StoreError,
}

impl LedgerError {
    /// Returns the machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::Core(err) => match err {
                CoreError::StockNotFound(_)
                | CoreError::SaleNotFound { .. }
                | CoreError::CommissionItemNotFound(_) => ErrorCode::NotFound,
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::RefundExceedsAvailable { .. } => ErrorCode::RefundExceedsAvailable,
                CoreError::PaymentExceedsCommission { .. } => ErrorCode::PaymentExceedsCommission,
                CoreError::Inconsistency(_) => ErrorCode::Inconsistency,
                CoreError::Validation(ValidationError::Duplicate { .. }) => ErrorCode::Duplicate,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            LedgerError::Store(err) => match err {
                DbError::NotFound { .. } => ErrorCode::NotFound,
                DbError::UniqueViolation { .. } => ErrorCode::Duplicate,
                DbError::Conflict { .. } => ErrorCode::Conflict,
                _ => ErrorCode::StoreError,
            },
        }
    }

    /// Returns true if re-running the whole operation may succeed.
    ///
    /// Ledger rule violations are never retryable: the same request against
    /// the same records fails the same way.
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::Store(err) => err.is_transient(),
            LedgerError::Core(_) => false,
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
