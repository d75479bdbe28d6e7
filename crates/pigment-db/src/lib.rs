//! # pigment-db: Record Store for Pigment
//!
//! This crate provides durable storage for the Pigment ledger.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pigment Data Flow                                │
//! │                                                                         │
//! │  Ledger operation (record_sale, process_refund)                        │
//! │       │                                                                 │
//! │       ▼  dyn RecordStore                                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pigment-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ StockRepo     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo      │    │ 001_init.sql │  │   │
//! │  │   │ RecordStore   │    │ CommissionRepo│    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/pigment/pigment.db                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (stock, sale, commission)
//! - [`store`] - The `RecordStore` trait the ledger depends on
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pigment_db::{Database, DbConfig, RecordStore};
//!
//! let db = Database::new(DbConfig::new("path/to/pigment.db")).await?;
//! let stock = db.find_stock("S1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::RecordStore;

// Repository re-exports for convenience
pub use repository::commission::CommissionRepository;
pub use repository::sale::SaleRepository;
pub use repository::stock::StockRepository;
