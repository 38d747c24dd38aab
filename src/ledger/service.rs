//! # Stock Ledger Service
//!
//! The public API of the ledger. Writes are routed to the product's actor through the
//! [`ActorRegistry`]; reads go straight to the store and never wait on an actor.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use super::{LedgerAction, LedgerActionResult, LedgerError, ReconcileReport, StockLedger};
use crate::framework::ActorRegistry;
use crate::integrity::IntegrityStatus;
use crate::model::{MovementOutcome, MovementRequest, MovementStats, Product, ProductId, StockMovement};
use crate::scanner::LowStockScanner;

#[derive(Clone)]
pub struct StockLedgerService {
    registry: Arc<ActorRegistry<StockLedger>>,
    scanner: LowStockScanner,
}

impl StockLedgerService {
    pub fn new(registry: Arc<ActorRegistry<StockLedger>>) -> Self {
        let ctx = registry.context();
        let scanner = LowStockScanner::new(ctx.store.clone(), ctx.config.low_stock_threshold);
        Self { registry, scanner }
    }

    pub fn scanner(&self) -> &LowStockScanner {
        &self.scanner
    }

    /// Validates and executes one stock change inside the product's critical section.
    #[instrument(skip(self, request), fields(product_id = %request.product_id, movement_type = %request.movement_type))]
    pub async fn apply_movement(&self, request: MovementRequest) -> Result<MovementOutcome, LedgerError> {
        debug!(?request, "apply_movement called");
        let product_id = request.product_id;
        let result = match self
            .registry
            .perform_action(product_id, LedgerAction::ApplyMovement(request))
            .await
        {
            Ok(LedgerActionResult::ApplyMovement(outcome)) => Ok(outcome),
            Ok(other) => Err(unexpected("ApplyMovement", &other)),
            Err(e) => Err(e),
        };

        match &result {
            Ok(outcome) => info!(
                previous_stock = outcome.movement.previous_stock,
                new_stock = outcome.movement.new_stock,
                movement_id = %outcome.movement.id,
                "Movement applied"
            ),
            Err(e) => log_refusal(e),
        }
        result
    }

    /// Resolves movements left pending by writes whose outcome was unknown.
    #[instrument(skip(self))]
    pub async fn reconcile_pending(&self, product_id: ProductId) -> Result<ReconcileReport, LedgerError> {
        match self
            .registry
            .perform_action(product_id, LedgerAction::ReconcilePending)
            .await?
        {
            LedgerActionResult::ReconcilePending(report) => {
                info!(completed = report.completed, failed = report.failed, "Pending movements reconciled");
                Ok(report)
            }
            other => Err(unexpected("ReconcilePending", &other)),
        }
    }

    /// Newest first; `limit` defaults to and is capped by configuration.
    #[instrument(skip(self))]
    pub async fn get_history(
        &self,
        product_id: ProductId,
        limit: Option<usize>,
    ) -> Result<Vec<StockMovement>, LedgerError> {
        let ctx = self.registry.context();
        // Distinguish "no movements" from "no such product".
        ctx.store.get_product(product_id).await?;
        let limit = ctx.config.effective_history_limit(limit);
        Ok(ctx.store.history(product_id, limit).await?)
    }

    /// Completed movements grouped by type.
    #[instrument(skip(self))]
    pub async fn get_statistics(&self, product_id: ProductId) -> Result<Vec<MovementStats>, LedgerError> {
        let ctx = self.registry.context();
        ctx.store.get_product(product_id).await?;
        Ok(ctx.store.statistics(product_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn check_integrity(&self, product_id: ProductId) -> Result<IntegrityStatus, LedgerError> {
        let status = self.registry.context().integrity.check(product_id).await?;
        if !status.is_consistent() {
            warn!(?status, "Integrity check failed");
        }
        Ok(status)
    }

    #[instrument(skip(self))]
    pub async fn find_low_stock(&self, threshold: Option<u32>) -> Result<Vec<Product>, LedgerError> {
        self.scanner.find_low_stock(threshold).await
    }

    pub async fn get_product(&self, product_id: ProductId) -> Result<Product, LedgerError> {
        Ok(self.registry.context().store.get_product(product_id).await?)
    }
}

fn unexpected(action: &str, result: &LedgerActionResult) -> LedgerError {
    LedgerError::ActorCommunication(format!("{action} answered with {result:?}"))
}

fn log_refusal(e: &LedgerError) {
    match e {
        LedgerError::InvalidOperation(_)
        | LedgerError::InsufficientStock { .. }
        | LedgerError::ProductNotFound(_)
        | LedgerError::ConcurrentConflict { .. } => warn!(code = e.code(), error = %e, "Movement refused"),
        LedgerError::Inconsistent { .. }
        | LedgerError::PendingExists { .. }
        | LedgerError::StorageTimeout { .. }
        | LedgerError::Unconfirmed { .. }
        | LedgerError::Storage(_)
        | LedgerError::ActorCommunication(_) => error!(code = e.code(), error = %e, "Movement failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::framework::RegistryConfig;
    use crate::ledger::LedgerContext;
    use crate::model::{CallerIdentity, MovementStatus, MovementType};
    use crate::store::InMemoryStockStore;
    use std::time::Duration;

    fn service(stock: u32) -> StockLedgerService {
        let store = Arc::new(InMemoryStockStore::new());
        store
            .insert_product(Product::new(ProductId(1), "Mug", 8.0, stock))
            .unwrap();
        let registry = Arc::new(ActorRegistry::new(
            LedgerContext::new(store, LedgerConfig::default()),
            RegistryConfig {
                mailbox_capacity: 8,
                idle_timeout: Duration::from_secs(5),
            },
        ));
        StockLedgerService::new(registry)
    }

    fn request(movement_type: MovementType, quantity: u32) -> MovementRequest {
        MovementRequest::new(
            ProductId(1),
            movement_type,
            quantity,
            CallerIdentity::new("admin-1", "admin"),
        )
    }

    #[tokio::test]
    async fn test_apply_movement_returns_product_and_completed_movement() {
        let ledger = service(20);
        let outcome = ledger
            .apply_movement(request(MovementType::Sale, 5).with_reason("order #12"))
            .await
            .unwrap();

        assert_eq!(outcome.product.stock, 15);
        assert_eq!(outcome.movement.previous_stock, 20);
        assert_eq!(outcome.movement.new_stock, 15);
        assert_eq!(outcome.movement.status, MovementStatus::Completed);
        assert_eq!(outcome.movement.reason.as_deref(), Some("order #12"));
    }

    #[tokio::test]
    async fn test_history_default_limit_and_cap() {
        let ledger = service(0);
        for _ in 0..3 {
            ledger.apply_movement(request(MovementType::Add, 1)).await.unwrap();
        }
        assert_eq!(ledger.get_history(ProductId(1), None).await.unwrap().len(), 3);
        assert_eq!(ledger.get_history(ProductId(1), Some(2)).await.unwrap().len(), 2);
        assert!(ledger.get_history(ProductId(1), Some(0)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_on_unknown_product_are_not_found() {
        let ledger = service(0);
        let missing = ProductId(99);
        assert_eq!(
            ledger.get_history(missing, None).await.unwrap_err(),
            LedgerError::ProductNotFound(missing)
        );
        assert_eq!(
            ledger.get_statistics(missing).await.unwrap_err(),
            LedgerError::ProductNotFound(missing)
        );
        assert_eq!(
            ledger.apply_movement(MovementRequest::new(
                missing,
                MovementType::Add,
                1,
                CallerIdentity::new("admin-1", "admin"),
            ))
            .await
            .unwrap_err(),
            LedgerError::ProductNotFound(missing)
        );
    }

    #[tokio::test]
    async fn test_reconcile_with_nothing_pending_is_a_no_op() {
        let ledger = service(4);
        ledger.apply_movement(request(MovementType::Add, 1)).await.unwrap();
        let report = ledger.reconcile_pending(ProductId(1)).await.unwrap();
        assert_eq!(report, ReconcileReport::default());
    }
}
