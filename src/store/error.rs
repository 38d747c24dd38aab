use crate::model::{MovementId, MovementStatus, ProductId};

/// All errors that can be returned by a [`StockStore`](super::StockStore) implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The catalog tried to create a product that already exists.
    #[error("product already exists: {0}")]
    ProductExists(ProductId),

    #[error("movement not found: {0}")]
    MovementNotFound(MovementId),

    /// Conditional stock update lost the race: the stored value was no longer the
    /// one the caller read.
    #[error("concurrent conflict on {product_id}: expected stock {expected}, found {actual}")]
    ConcurrentConflict {
        product_id: ProductId,
        expected: u32,
        actual: u32,
    },

    /// Completed and failed movements are immutable.
    #[error("movement {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: MovementId,
        from: MovementStatus,
        to: MovementStatus,
    },

    /// The call did not finish within the configured storage timeout. Whether it
    /// took effect is unknown.
    #[error("storage call {operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// A backend-specific storage error (connection, serialization, poisoned lock).
    #[error("storage backend error: {0}")]
    Backend(String),
}
