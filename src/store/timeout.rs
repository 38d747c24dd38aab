use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{StockStore, StoreError};
use crate::model::{MovementId, MovementStats, MovementStatus, Product, ProductId, StockMovement};

/// Decorator that bounds every call on the wrapped store.
///
/// A call that exceeds the deadline is dropped and reported as
/// [`StoreError::Timeout`]. Nothing is retried here.
#[derive(Clone)]
pub struct TimeoutStore {
    inner: Arc<dyn StockStore>,
    timeout: Duration,
}

impl TimeoutStore {
    pub fn new(inner: Arc<dyn StockStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout {
                operation,
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

#[async_trait]
impl StockStore for TimeoutStore {
    async fn get_product(&self, id: ProductId) -> Result<Product, StoreError> {
        self.bounded("get_product", self.inner.get_product(id)).await
    }

    async fn low_stock_products(&self, threshold: u32) -> Result<Vec<Product>, StoreError> {
        self.bounded(
            "low_stock_products",
            self.inner.low_stock_products(threshold),
        )
        .await
    }

    async fn compare_and_set_stock(
        &self,
        id: ProductId,
        expected: u32,
        new_stock: u32,
    ) -> Result<Product, StoreError> {
        self.bounded(
            "compare_and_set_stock",
            self.inner.compare_and_set_stock(id, expected, new_stock),
        )
        .await
    }

    async fn insert_movement(&self, movement: StockMovement) -> Result<StockMovement, StoreError> {
        self.bounded("insert_movement", self.inner.insert_movement(movement))
            .await
    }

    async fn set_movement_status(
        &self,
        id: MovementId,
        status: MovementStatus,
    ) -> Result<StockMovement, StoreError> {
        self.bounded(
            "set_movement_status",
            self.inner.set_movement_status(id, status),
        )
        .await
    }

    async fn latest_completed_movement(
        &self,
        product_id: ProductId,
    ) -> Result<Option<StockMovement>, StoreError> {
        self.bounded(
            "latest_completed_movement",
            self.inner.latest_completed_movement(product_id),
        )
        .await
    }

    async fn count_pending(&self, product_id: ProductId) -> Result<usize, StoreError> {
        self.bounded("count_pending", self.inner.count_pending(product_id))
            .await
    }

    async fn history(
        &self,
        product_id: ProductId,
        limit: usize,
    ) -> Result<Vec<StockMovement>, StoreError> {
        self.bounded("history", self.inner.history(product_id, limit))
            .await
    }

    async fn statistics(&self, product_id: ProductId) -> Result<Vec<MovementStats>, StoreError> {
        self.bounded("statistics", self.inner.statistics(product_id))
            .await
    }
}
