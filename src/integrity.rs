//! # Integrity Checker
//!
//! Pre-flight guard run before risky movements. It compares a product's stored stock
//! with the `new_stock` of its latest completed movement and looks for movements still
//! in flight. Either condition means the ledger can no longer vouch for the number and
//! the movement must be refused.

use std::sync::Arc;

use serde::Serialize;
use tracing::error;

use crate::ledger::LedgerError;
use crate::model::ProductId;
use crate::store::StockStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum IntegrityStatus {
    Consistent,
    #[serde(rename_all = "camelCase")]
    Inconsistent { stock: u32, ledger_stock: u32 },
    PendingExists { pending: usize },
}

impl IntegrityStatus {
    pub fn is_consistent(&self) -> bool {
        matches!(self, IntegrityStatus::Consistent)
    }
}

#[derive(Clone)]
pub struct IntegrityChecker {
    store: Arc<dyn StockStore>,
}

impl IntegrityChecker {
    pub fn new(store: Arc<dyn StockStore>) -> Self {
        Self { store }
    }

    /// Reports the product's integrity without refusing anything.
    ///
    /// Pending movements are reported ahead of a mismatch: an in-flight write
    /// explains a transient difference. A product with no completed movement has
    /// nothing to contradict and is consistent.
    pub async fn check(&self, product_id: ProductId) -> Result<IntegrityStatus, LedgerError> {
        let product = self.store.get_product(product_id).await?;

        let pending = self.store.count_pending(product_id).await?;
        if pending > 0 {
            return Ok(IntegrityStatus::PendingExists { pending });
        }

        match self.store.latest_completed_movement(product_id).await? {
            Some(latest) if latest.new_stock != product.stock => Ok(IntegrityStatus::Inconsistent {
                stock: product.stock,
                ledger_stock: latest.new_stock,
            }),
            _ => Ok(IntegrityStatus::Consistent),
        }
    }

    /// Like [`check`](Self::check), but turns anything but `Consistent` into an error.
    pub async fn ensure(&self, product_id: ProductId) -> Result<(), LedgerError> {
        match self.check(product_id).await? {
            IntegrityStatus::Consistent => Ok(()),
            IntegrityStatus::PendingExists { pending } => Err(refuse_pending(product_id, pending)),
            IntegrityStatus::Inconsistent {
                stock,
                ledger_stock,
            } => {
                error!(%product_id, stock, ledger_stock, "Integrity check refused: stock mismatch");
                Err(LedgerError::Inconsistent {
                    product_id,
                    stock,
                    ledger_stock,
                })
            }
        }
    }

    /// Refuses while any movement of the product is still `pending`.
    ///
    /// Runs before every movement whatever the policy: a pending record may stand for a
    /// stock write that already landed, and nothing may be chained after it until
    /// reconciliation settles it.
    pub async fn ensure_settled(&self, product_id: ProductId) -> Result<(), LedgerError> {
        match self.store.count_pending(product_id).await? {
            0 => Ok(()),
            pending => Err(refuse_pending(product_id, pending)),
        }
    }
}

fn refuse_pending(product_id: ProductId, pending: usize) -> LedgerError {
    error!(%product_id, pending, "Integrity check refused: pending movements");
    LedgerError::PendingExists {
        product_id,
        pending,
    }
}
