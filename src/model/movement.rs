//! Movement records: the append-only facts that make up a product's ledger.

use crate::model::{CallerIdentity, ProductId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

/// The closed set of stock-changing operations.
///
/// The formula each variant applies lives in [`crate::ledger::transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Add,
    Subtract,
    Set,
    Sale,
    Purchase,
    Adjustment,
}

impl MovementType {
    /// Every variant, in declaration order. Statistics are reported in this order.
    pub const ALL: [MovementType; 6] = [
        MovementType::Add,
        MovementType::Subtract,
        MovementType::Set,
        MovementType::Sale,
        MovementType::Purchase,
        MovementType::Adjustment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Add => "add",
            MovementType::Subtract => "subtract",
            MovementType::Set => "set",
            MovementType::Sale => "sale",
            MovementType::Purchase => "purchase",
            MovementType::Adjustment => "adjustment",
        }
    }
}

impl Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a caller names an operation outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown movement type '{0}'")]
pub struct UnknownMovementType(pub String);

/// Parsing is exact: `"Sale"` or `" sale"` are rejected rather than coerced.
impl FromStr for MovementType {
    type Err = UnknownMovementType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MovementType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownMovementType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementStatus {
    /// Written before the product update; not yet confirmed.
    Pending,
    Completed,
    /// The product update never happened.
    Failed,
}

impl MovementStatus {
    /// The only legal transitions are out of `Pending`.
    pub fn can_transition_to(&self, next: MovementStatus) -> bool {
        matches!(
            (self, next),
            (MovementStatus::Pending, MovementStatus::Completed)
                | (MovementStatus::Pending, MovementStatus::Failed)
        )
    }
}

impl Display for MovementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MovementStatus::Pending => "pending",
            MovementStatus::Completed => "completed",
            MovementStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(pub Uuid);

impl MovementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MovementId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for MovementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recorded stock change.
///
/// `previous_stock` and `new_stock` are the only source of truth for what the stock
/// was at a given time. Records are never edited apart from the status transition
/// that brackets the product write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    pub movement_type: MovementType,
    pub quantity: u32,
    pub previous_stock: u32,
    pub new_stock: u32,
    pub reason: Option<String>,
    pub user_id: UserId,
    pub user_role: String,
    pub status: MovementStatus,
    pub created_at: DateTime<Utc>,
    /// Assigned by the store on insert; breaks ties between equal timestamps.
    pub sequence: u64,
}

impl StockMovement {
    /// Builds the `pending` record written before the product update.
    pub fn pending(request: &MovementRequest, previous_stock: u32, new_stock: u32) -> Self {
        Self {
            id: MovementId::new(),
            product_id: request.product_id,
            movement_type: request.movement_type,
            quantity: request.quantity,
            previous_stock,
            new_stock,
            reason: request.reason.clone(),
            user_id: request.caller.user_id.clone(),
            user_role: request.caller.role.clone(),
            status: MovementStatus::Pending,
            created_at: Utc::now(),
            sequence: 0,
        }
    }
}

/// A validated request to change one product's stock.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementRequest {
    pub product_id: ProductId,
    pub movement_type: MovementType,
    pub quantity: u32,
    pub reason: Option<String>,
    pub caller: CallerIdentity,
}

impl MovementRequest {
    pub fn new(
        product_id: ProductId,
        movement_type: MovementType,
        quantity: u32,
        caller: CallerIdentity,
    ) -> Self {
        Self {
            product_id,
            movement_type,
            quantity,
            reason: None,
            caller,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// What a successful movement hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementOutcome {
    pub product: crate::model::Product,
    pub movement: StockMovement,
}

/// Per-type aggregate over a product's completed movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementStats {
    pub movement_type: MovementType,
    pub count: u64,
    pub total_quantity: u64,
}
