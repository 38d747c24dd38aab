//! The Stock Ledger: validated, audited stock changes serialized per product.
//!
//! - [`StockLedgerService`] is the entry point callers use.
//! - [`StockLedger`] is the per-product actor behind it.
//! - [`next_stock`] is the formula every movement type applies.

mod actions;
pub mod entity;
pub mod error;
mod service;
pub mod transition;

pub use actions::*;
pub use entity::{LedgerContext, StockLedger};
pub use error::LedgerError;
pub use service::StockLedgerService;
pub use transition::next_stock;
