use async_trait::async_trait;

use super::StoreError;
use crate::model::{MovementId, MovementStats, MovementStatus, Product, ProductId, StockMovement};

/// The persistence boundary for product stock and the movement ledger.
///
/// ## Single writer
///
/// [`compare_and_set_stock`](StockStore::compare_and_set_stock) is the only method that
/// changes a product's stock, and the ledger actor is its only production caller.
///
/// ## OCC conflict detection
///
/// `compare_and_set_stock` is conditional: `UPDATE stock WHERE stock = expected`. If the
/// stored value differs, it returns `Err(StoreError::ConcurrentConflict { .. })` and
/// writes nothing. This holds even when several ledger processes share one store.
///
/// ## Ordering
///
/// Movements are indexed by `(product_id, created_at desc)`; `sequence` breaks ties.
/// Every list-returning read is newest first unless stated otherwise.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so they can be shared by every
/// per-product actor and by the lock-free read paths.
#[async_trait]
pub trait StockStore: Send + Sync + 'static {
    // ── Products ─────────────────────────────────────────────────────────────

    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError>;

    /// Every accessible product with `stock <= threshold`, ordered by ascending stock
    /// then id.
    async fn low_stock_products(&self, threshold: u32) -> Result<Vec<Product>, StoreError>;

    /// Conditionally replace the stock value and return the updated product.
    async fn compare_and_set_stock(
        &self,
        id: ProductId,
        expected: u32,
        new_stock: u32,
    ) -> Result<Product, StoreError>;

    // ── Movements ────────────────────────────────────────────────────────────

    /// Append a movement; the store assigns `sequence` and returns the stored record.
    async fn insert_movement(&self, movement: StockMovement) -> Result<StockMovement, StoreError>;

    /// Move a `pending` record to `completed` or `failed`.
    ///
    /// Any other transition is `Err(StoreError::InvalidTransition)`.
    async fn set_movement_status(
        &self,
        id: MovementId,
        status: MovementStatus,
    ) -> Result<StockMovement, StoreError>;

    /// The newest `completed` movement for a product, if any.
    async fn latest_completed_movement(
        &self,
        product_id: ProductId,
    ) -> Result<Option<StockMovement>, StoreError>;

    async fn count_pending(&self, product_id: ProductId) -> Result<usize, StoreError>;

    /// Up to `limit` movements of any status, newest first.
    async fn history(
        &self,
        product_id: ProductId,
        limit: usize,
    ) -> Result<Vec<StockMovement>, StoreError>;

    /// Completed movements grouped by type, in [`MovementType::ALL`](crate::model::MovementType::ALL)
    /// order. Types with no movements are omitted.
    async fn statistics(&self, product_id: ProductId) -> Result<Vec<MovementStats>, StoreError>;
}
