//! # Repository Module
//!
//! Database repository implementations for Pigment.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Ledger service                                                        │
//! │       │                                                                 │
//! │       │  db.stocks().find("S1")                                        │
//! │       ▼                                                                 │
//! │  StockRepository                                                       │
//! │  ├── find(&self, stock_id)                                             │
//! │  ├── find_all(&self)                                                   │
//! │  ├── create(&self, stock)                                              │
//! │  ├── save(&self, stock)      ← optimistic, version checked             │
//! │  └── delete(&self, stock_id)                                           │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`stock::StockRepository`] - Stock units
//! - [`sale::SaleRepository`] - Sales, including per-stock listing
//! - [`commission::CommissionRepository`] - Agent commission items

pub mod commission;
pub mod sale;
pub mod stock;
