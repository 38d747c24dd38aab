use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{StockStore, StoreError};
use crate::model::{
    MovementId, MovementStats, MovementStatus, MovementType, Product, ProductId, StockMovement,
};

#[derive(Default)]
struct State {
    products: BTreeMap<ProductId, Product>,
    /// Per-product movements in insertion (sequence) order.
    movements: HashMap<ProductId, Vec<StockMovement>>,
    locations: HashMap<MovementId, (ProductId, usize)>,
    next_sequence: u64,
}

/// In-process [`StockStore`] backed by a single `RwLock`.
///
/// Every trait method takes the lock once and never holds it across an `.await`, so
/// each call is atomic on its own. That is what makes `compare_and_set_stock` a real
/// compare-and-swap here.
#[derive(Default)]
pub struct InMemoryStockStore {
    state: RwLock<State>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog-side creation of a product. The ledger never calls this.
    pub fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.products.contains_key(&product.id) {
            return Err(StoreError::ProductExists(product.id));
        }
        state.products.insert(product.id, product);
        Ok(())
    }

    /// Catalog-side toggle of the access flag.
    pub fn set_accessible(&self, id: ProductId, is_accessible: bool) -> Result<Product, StoreError> {
        let mut state = self.write()?;
        let product = state
            .products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;
        product.is_accessible = is_accessible;
        Ok(product.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }
}

fn newest_first(movements: &[StockMovement]) -> Vec<&StockMovement> {
    let mut sorted: Vec<&StockMovement> = movements.iter().collect();
    sorted.sort_by(|a, b| (b.created_at, b.sequence).cmp(&(a.created_at, a.sequence)));
    sorted
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
        self.read()?
            .products
            .get(&id)
            .cloned()
            .ok_or(StoreError::ProductNotFound(id))
    }

    async fn low_stock_products(&self, threshold: u32) -> Result<Vec<Product>, StoreError> {
        let state = self.read()?;
        let mut low: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.is_accessible && p.stock <= threshold)
            .cloned()
            .collect();
        low.sort_by_key(|p| (p.stock, p.id));
        Ok(low)
    }

    async fn compare_and_set_stock(
        &self,
        id: ProductId,
        expected: u32,
        new_stock: u32,
    ) -> Result<Product, StoreError> {
        let mut state = self.write()?;
        let product = state
            .products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;
        if product.stock != expected {
            return Err(StoreError::ConcurrentConflict {
                product_id: id,
                expected,
                actual: product.stock,
            });
        }
        product.stock = new_stock;
        Ok(product.clone())
    }

    async fn insert_movement(
        &self,
        mut movement: StockMovement,
    ) -> Result<StockMovement, StoreError> {
        let mut state = self.write()?;
        if !state.products.contains_key(&movement.product_id) {
            return Err(StoreError::ProductNotFound(movement.product_id));
        }
        state.next_sequence += 1;
        movement.sequence = state.next_sequence;

        let entries = state.movements.entry(movement.product_id).or_default();
        let index = entries.len();
        entries.push(movement.clone());
        state
            .locations
            .insert(movement.id, (movement.product_id, index));
        Ok(movement)
    }

    async fn set_movement_status(
        &self,
        id: MovementId,
        status: MovementStatus,
    ) -> Result<StockMovement, StoreError> {
        let mut state = self.write()?;
        let (product_id, index) = *state
            .locations
            .get(&id)
            .ok_or(StoreError::MovementNotFound(id))?;
        let movement = state
            .movements
            .get_mut(&product_id)
            .and_then(|entries| entries.get_mut(index))
            .ok_or(StoreError::MovementNotFound(id))?;
        if !movement.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id,
                from: movement.status,
                to: status,
            });
        }
        movement.status = status;
        Ok(movement.clone())
    }

    async fn latest_completed_movement(
        &self,
        product_id: ProductId,
    ) -> Result<Option<StockMovement>, StoreError> {
        let state = self.read()?;
        let latest = state.movements.get(&product_id).and_then(|entries| {
            entries
                .iter()
                .filter(|m| m.status == MovementStatus::Completed)
                .max_by_key(|m| (m.created_at, m.sequence))
                .cloned()
        });
        Ok(latest)
    }

    async fn count_pending(&self, product_id: ProductId) -> Result<usize, StoreError> {
        let state = self.read()?;
        Ok(state
            .movements
            .get(&product_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|m| m.status == MovementStatus::Pending)
                    .count()
            })
            .unwrap_or(0))
    }

    async fn history(
        &self,
        product_id: ProductId,
        limit: usize,
    ) -> Result<Vec<StockMovement>, StoreError> {
        let state = self.read()?;
        let Some(entries) = state.movements.get(&product_id) else {
            return Ok(Vec::new());
        };
        Ok(newest_first(entries)
            .into_iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn statistics(&self, product_id: ProductId) -> Result<Vec<MovementStats>, StoreError> {
        let state = self.read()?;
        let mut grouped: BTreeMap<MovementType, (u64, u64)> = BTreeMap::new();
        for movement in state
            .movements
            .get(&product_id)
            .into_iter()
            .flatten()
            .filter(|m| m.status == MovementStatus::Completed)
        {
            let entry = grouped.entry(movement.movement_type).or_default();
            entry.0 += 1;
            entry.1 += u64::from(movement.quantity);
        }
        Ok(grouped
            .into_iter()
            .map(|(movement_type, (count, total_quantity))| MovementStats {
                movement_type,
                count,
                total_quantity,
            })
            .collect())
    }
}
