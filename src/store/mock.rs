//! # Mock Store & Fault Injection
//!
//! [`MockStockStore`] implements [`StockStore`] on top of a real [`InMemoryStockStore`]
//! but lets a test script faults for individual calls: return an error, or stall long
//! enough to trip the storage timeout. Calls without a scripted fault pass straight
//! through to the inner store.
//!
//! ## When to use the mock vs the in-memory store
//!
//! | Feature | MockStockStore | InMemoryStockStore |
//! |---------|----------------|--------------------|
//! | **State** | Real (delegates) | Real |
//! | **Error Injection** | Easy (`return_err`, `stall_for`) | Impossible |
//! | **Call counting** | Yes (`calls`) | No |
//! | **Use Case** | Failure paths of the ledger write protocol | Everything else |
//!
//! ## Example
//!
//! ```rust
//! use stock_ledger::model::{Product, ProductId};
//! use stock_ledger::store::mock::{MockStockStore, StoreOp};
//! use stock_ledger::store::{StockStore, StoreError};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockStockStore::new();
//!     mock.inner()
//!         .insert_product(Product::new(ProductId(1), "Widget", 2.0, 10))
//!         .unwrap();
//!
//!     // Simulate a backend outage on the next conditional update
//!     mock.expect(StoreOp::CompareAndSetStock)
//!         .return_err(StoreError::Backend("connection reset".into()));
//!
//!     let result = mock.compare_and_set_stock(ProductId(1), 10, 5).await;
//!     assert!(matches!(result, Err(StoreError::Backend(_))));
//!
//!     // The fault was consumed; the next call reaches the real store
//!     let product = mock.compare_and_set_stock(ProductId(1), 10, 5).await.unwrap();
//!     assert_eq!(product.stock, 5);
//!     mock.verify();
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{InMemoryStockStore, StockStore, StoreError};
use crate::model::{MovementId, MovementStats, MovementStatus, Product, ProductId, StockMovement};

/// Identifies one [`StockStore`] method for fault scripting and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetProduct,
    LowStockProducts,
    CompareAndSetStock,
    InsertMovement,
    SetMovementStatus,
    LatestCompletedMovement,
    CountPending,
    History,
    Statistics,
}

/// A scripted outcome for the next call of one operation.
#[derive(Debug, Clone)]
enum Fault {
    Error(StoreError),
    /// Sleep before delegating. Long enough stalls get cut off by `TimeoutStore`.
    Stall(Duration),
}

#[derive(Default)]
struct Script {
    faults: HashMap<StoreOp, VecDeque<Fault>>,
    calls: HashMap<StoreOp, usize>,
}

/// A fault-injecting [`StockStore`] for tests.
#[derive(Clone, Default)]
pub struct MockStockStore {
    inner: Arc<InMemoryStockStore>,
    script: Arc<Mutex<Script>>,
}

impl MockStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The real store behind the mock, for seeding and direct inspection.
    pub fn inner(&self) -> &InMemoryStockStore {
        &self.inner
    }

    /// Scripts the next call of `op`. Faults for the same op queue in order.
    pub fn expect(&self, op: StoreOp) -> FaultBuilder {
        FaultBuilder {
            op,
            script: self.script.clone(),
        }
    }

    /// How many times `op` has been called, faulted or not.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Panics if any scripted fault was never consumed.
    pub fn verify(&self) {
        let script = self.lock();
        let remaining: usize = script.faults.values().map(VecDeque::len).sum();
        if remaining > 0 {
            panic!("Not all scripted faults were consumed. {} remaining", remaining);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the call and applies its fault, if one is scripted.
    async fn intercept(&self, op: StoreOp) -> Result<(), StoreError> {
        let fault = {
            let mut script = self.lock();
            *script.calls.entry(op).or_default() += 1;
            script.faults.get_mut(&op).and_then(VecDeque::pop_front)
        };
        match fault {
            None => Ok(()),
            Some(Fault::Error(e)) => Err(e),
            Some(Fault::Stall(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
        }
    }
}

/// Builder for one scripted fault.
pub struct FaultBuilder {
    op: StoreOp,
    script: Arc<Mutex<Script>>,
}

impl FaultBuilder {
    /// The call fails with `error` without reaching the inner store.
    pub fn return_err(self, error: StoreError) {
        self.push(Fault::Error(error));
    }

    /// The call sleeps for `duration`, then reaches the inner store.
    pub fn stall_for(self, duration: Duration) {
        self.push(Fault::Stall(duration));
    }

    fn push(self, fault: Fault) {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        script.faults.entry(self.op).or_default().push_back(fault);
    }
}

#[async_trait]
impl StockStore for MockStockStore {
    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
        self.intercept(StoreOp::GetProduct).await?;
        self.inner.get_product(id).await
    }

    async fn low_stock_products(&self, threshold: u32) -> Result<Vec<Product>, StoreError> {
        self.intercept(StoreOp::LowStockProducts).await?;
        self.inner.low_stock_products(threshold).await
    }

    async fn compare_and_set_stock(
        &self,
        id: ProductId,
        expected: u32,
        new_stock: u32,
    ) -> Result<Product, StoreError> {
        self.intercept(StoreOp::CompareAndSetStock).await?;
        self.inner.compare_and_set_stock(id, expected, new_stock).await
    }

    async fn insert_movement(&self, movement: StockMovement) -> Result<StockMovement, StoreError> {
        self.intercept(StoreOp::InsertMovement).await?;
        self.inner.insert_movement(movement).await
    }

    async fn set_movement_status(
        &self,
        id: MovementId,
        status: MovementStatus,
    ) -> Result<StockMovement, StoreError> {
        self.intercept(StoreOp::SetMovementStatus).await?;
        self.inner.set_movement_status(id, status).await
    }

    async fn latest_completed_movement(
        &self,
        product_id: ProductId,
    ) -> Result<Option<StockMovement>, StoreError> {
        self.intercept(StoreOp::LatestCompletedMovement).await?;
        self.inner.latest_completed_movement(product_id).await
    }

    async fn count_pending(&self, product_id: ProductId) -> Result<usize, StoreError> {
        self.intercept(StoreOp::CountPending).await?;
        self.inner.count_pending(product_id).await
    }

    async fn history(
        &self,
        product_id: ProductId,
        limit: usize,
    ) -> Result<Vec<StockMovement>, StoreError> {
        self.intercept(StoreOp::History).await?;
        self.inner.history(product_id, limit).await
    }

    async fn statistics(&self, product_id: ProductId) -> Result<Vec<MovementStats>, StoreError> {
        self.intercept(StoreOp::Statistics).await?;
        self.inner.statistics(product_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_faults_queue_per_operation() {
        let mock = MockStockStore::new();
        mock.inner()
            .insert_product(Product::new(ProductId(1), "Widget", 1.0, 3))
            .unwrap();

        mock.expect(StoreOp::GetProduct)
            .return_err(StoreError::Backend("first".into()));
        mock.expect(StoreOp::GetProduct)
            .return_err(StoreError::Backend("second".into()));

        assert_eq!(
            mock.get_product(ProductId(1)).await,
            Err(StoreError::Backend("first".into()))
        );
        // Other operations are unaffected by GetProduct faults
        assert_eq!(mock.count_pending(ProductId(1)).await, Ok(0));
        assert_eq!(
            mock.get_product(ProductId(1)).await,
            Err(StoreError::Backend("second".into()))
        );
        assert_eq!(mock.get_product(ProductId(1)).await.unwrap().stock, 3);

        assert_eq!(mock.calls(StoreOp::GetProduct), 3);
        assert_eq!(mock.calls(StoreOp::CountPending), 1);
        mock.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Not all scripted faults were consumed")]
    async fn test_verify_panics_on_unused_fault() {
        let mock = MockStockStore::new();
        mock.expect(StoreOp::History).stall_for(Duration::from_millis(1));
        mock.verify();
    }
}
