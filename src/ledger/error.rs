//! Error types for the stock ledger.

use crate::framework::FrameworkError;
use crate::model::{MovementId, ProductId};
use crate::store::StoreError;
use thiserror::Error;

/// Everything a ledger operation can refuse or fail with.
///
/// Every variant carries the numbers needed to explain the refusal; none carries
/// storage internals that should not reach a client.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Bad input: zero quantity, unknown operation, overflow.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The movement would take stock below zero or below the product's floor.
    #[error("Insufficient stock: current {current_stock}, requested {requested}, short by {shortage}")]
    InsufficientStock {
        current_stock: u32,
        requested: u32,
        shortage: u32,
        minimum_stock: u32,
    },

    /// Other writers kept winning the compare-and-set.
    #[error("Concurrent conflict on {product_id} after {attempts} attempts")]
    ConcurrentConflict { product_id: ProductId, attempts: u32 },

    /// Stored stock disagrees with the ledger's latest completed movement.
    #[error("Stock inconsistent for {product_id}: product has {stock}, ledger says {ledger_stock}")]
    Inconsistent {
        product_id: ProductId,
        stock: u32,
        ledger_stock: u32,
    },

    /// Movements are still in flight (or were left unresolved by a timed-out write).
    #[error("{pending} pending movement(s) for {product_id}")]
    PendingExists { product_id: ProductId, pending: usize },

    #[error("Storage call {operation} timed out after {timeout_ms}ms")]
    StorageTimeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// The stock write landed but its movement could not be flipped to `completed`.
    /// Resending would apply the change twice; reconciliation settles the movement.
    #[error("Stock of {product_id} was written but movement {movement_id} is unconfirmed: {reason}")]
    Unconfirmed {
        product_id: ProductId,
        movement_id: MovementId,
        reason: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}

impl LedgerError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            LedgerError::InvalidOperation(_) => "INVALID_OPERATION",
            LedgerError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            LedgerError::ConcurrentConflict { .. } => "CONCURRENT_CONFLICT",
            LedgerError::Inconsistent { .. } => "STOCK_INCONSISTENT",
            LedgerError::PendingExists { .. } => "STOCK_PENDING",
            LedgerError::StorageTimeout { .. } => "STORAGE_TIMEOUT",
            LedgerError::Unconfirmed { .. } => "MOVEMENT_UNCONFIRMED",
            LedgerError::Storage(_) => "STORAGE_ERROR",
            LedgerError::ActorCommunication(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status an API layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            LedgerError::InvalidOperation(_) | LedgerError::InsufficientStock { .. } => 400,
            LedgerError::ProductNotFound(_) => 404,
            LedgerError::ConcurrentConflict { .. }
            | LedgerError::Inconsistent { .. }
            | LedgerError::PendingExists { .. } => 409,
            LedgerError::StorageTimeout { .. } => 503,
            LedgerError::Unconfirmed { .. }
            | LedgerError::Storage(_)
            | LedgerError::ActorCommunication(_) => 500,
        }
    }

    /// Whether a caller may safely resend the same request.
    ///
    /// Integrity refusals need an operator and are never retryable. Neither is
    /// [`Unconfirmed`](Self::Unconfirmed): the stock has already moved.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::ConcurrentConflict { .. } | LedgerError::StorageTimeout { .. }
        )
    }

    /// Refused for integrity reasons rather than business rules.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            LedgerError::Inconsistent { .. } | LedgerError::PendingExists { .. }
        )
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ProductNotFound(id) => LedgerError::ProductNotFound(id),
            StoreError::ConcurrentConflict { product_id, .. } => LedgerError::ConcurrentConflict {
                product_id,
                attempts: 1,
            },
            StoreError::Timeout {
                operation,
                timeout_ms,
            } => LedgerError::StorageTimeout {
                operation,
                timeout_ms,
            },
            other => LedgerError::Storage(other.to_string()),
        }
    }
}

impl From<FrameworkError> for LedgerError {
    fn from(e: FrameworkError) -> Self {
        LedgerError::ActorCommunication(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_errors_have_distinct_codes() {
        let inconsistent = LedgerError::Inconsistent {
            product_id: ProductId(1),
            stock: 5,
            ledger_stock: 7,
        };
        let pending = LedgerError::PendingExists {
            product_id: ProductId(1),
            pending: 1,
        };
        let conflict = LedgerError::ConcurrentConflict {
            product_id: ProductId(1),
            attempts: 3,
        };
        assert_eq!(inconsistent.status_code(), 409);
        assert_eq!(pending.status_code(), 409);
        assert_eq!(conflict.status_code(), 409);
        assert_ne!(inconsistent.code(), conflict.code());
        assert_ne!(pending.code(), conflict.code());
        assert!(!inconsistent.is_retryable());
        assert!(conflict.is_retryable());
    }

    #[test]
    fn test_store_timeout_becomes_storage_timeout() {
        let err: LedgerError = StoreError::Timeout {
            operation: "compare_and_set_stock",
            timeout_ms: 20,
        }
        .into();
        assert_eq!(err.status_code(), 503);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unconfirmed_write_is_not_retryable() {
        let err = LedgerError::Unconfirmed {
            product_id: ProductId(1),
            movement_id: MovementId::new(),
            reason: "Storage call set_movement_status timed out after 50ms".into(),
        };
        assert!(!err.is_retryable());
        assert!(!err.is_integrity());
        assert_eq!(err.code(), "MOVEMENT_UNCONFIRMED");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_backend_error_is_opaque_500() {
        let err: LedgerError = StoreError::Backend("disk full".into()).into();
        assert_eq!(err.code(), "STORAGE_ERROR");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_framework_error_maps_to_actor_communication() {
        let err: LedgerError = FrameworkError::ActorClosed.into();
        assert!(matches!(err, LedgerError::ActorCommunication(_)));
        assert_eq!(err.status_code(), 500);
    }
}
