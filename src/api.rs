//! # API Boundary
//!
//! Request and response shapes for the HTTP layer that fronts the ledger. The router
//! itself lives elsewhere; it maps 1:1 onto these types:
//!
//! | Route | Request | Response |
//! |---|---|---|
//! | `PUT /products/:id/stock` | [`StockUpdateRequest`] | [`StockUpdateResponse`] |
//! | `GET /products/:id/stock/history?limit=` | [`HistoryQuery`] | `[StockMovement]` |
//! | `GET /products/stock/low?threshold=` | [`LowStockQuery`] | `[Product]` |
//!
//! Every failure is answered with [`LedgerError::status_code`] and an [`ErrorBody`].

use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;
use crate::model::{
    CallerIdentity, MovementOutcome, MovementRequest, MovementType, Product, ProductId,
    StockMovement,
};

/// Body of `PUT /products/:id/stock`.
///
/// `quantity` is signed on the wire so that a negative value is reported as an invalid
/// operation instead of a deserialization failure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdateRequest {
    pub quantity: i64,
    pub operation: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl StockUpdateRequest {
    /// Validates the body into a request the ledger accepts.
    pub fn into_movement(
        self,
        product_id: ProductId,
        caller: CallerIdentity,
    ) -> Result<MovementRequest, LedgerError> {
        let movement_type: MovementType = self
            .operation
            .parse()
            .map_err(|e| LedgerError::InvalidOperation(format!("{e}")))?;
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            LedgerError::InvalidOperation(format!(
                "quantity must be between 0 and {}, got {}",
                u32::MAX,
                self.quantity
            ))
        })?;

        let mut request = MovementRequest::new(product_id, movement_type, quantity, caller);
        request.reason = self.reason.filter(|r| !r.trim().is_empty());
        Ok(request)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockUpdateResponse {
    pub product: Product,
    pub movement: StockMovement,
}

impl From<MovementOutcome> for StockUpdateResponse {
    fn from(outcome: MovementOutcome) -> Self {
        Self {
            product: outcome.product,
            movement: outcome.movement,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<u32>,
}

/// Client-safe error payload.
///
/// Storage and actor failures are reduced to a generic message; their details stay in
/// the logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortage: Option<u32>,
}

impl From<&LedgerError> for ErrorBody {
    fn from(e: &LedgerError) -> Self {
        let message = match e {
            LedgerError::Storage(_) | LedgerError::ActorCommunication(_) => {
                "Internal error, please retry later".to_string()
            }
            LedgerError::StorageTimeout { .. } => "Storage did not answer in time".to_string(),
            LedgerError::Unconfirmed { .. } => {
                "Stock was updated but the movement is unconfirmed, do not resend".to_string()
            }
            other => other.to_string(),
        };
        let (current_stock, requested, shortage) = match e {
            LedgerError::InsufficientStock {
                current_stock,
                requested,
                shortage,
                ..
            } => (Some(*current_stock), Some(*requested), Some(*shortage)),
            LedgerError::Inconsistent { stock, .. } => (Some(*stock), None, None),
            _ => (None, None, None),
        };
        Self {
            code: e.code(),
            message,
            current_stock,
            requested,
            shortage,
        }
    }
}
