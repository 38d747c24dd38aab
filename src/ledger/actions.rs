//! The operations a per-product ledger actor serializes.

use serde::Serialize;

use crate::model::{MovementOutcome, MovementRequest};

/// Work sent to the actor owning one product.
///
/// Reads (history, statistics, integrity, low stock) never go through the actor.
#[derive(Debug, Clone)]
pub enum LedgerAction {
    /// Validate and execute one stock change.
    ApplyMovement(MovementRequest),
    /// Resolve movements left `pending` by a write whose outcome was unknown.
    ReconcilePending,
}

/// Results from LedgerActions - variants match 1:1 with LedgerAction
#[derive(Debug, Clone)]
pub enum LedgerActionResult {
    ApplyMovement(MovementOutcome),
    ReconcilePending(ReconcileReport),
}

/// How many pending movements reconciliation resolved each way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub completed: usize,
    pub failed: usize,
}
