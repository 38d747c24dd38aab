//! [`ActorEntity`] implementation for the stock ledger.
//!
//! One [`KeyedActor`](crate::framework::KeyedActor) per product runs these handlers, so
//! everything here executes inside that product's critical section. The
//! compare-and-set on the store still guards against writers outside this process.
//!
//! ## Write protocol
//!
//! 1. Insert the movement as `pending`.
//! 2. `compare_and_set_stock(previous → new)`.
//! 3. Flip the movement to `completed`.
//!
//! A conflict or backend error at step 2 flips the movement to `failed` and leaves the
//! product untouched. A timeout at step 2 has an unknown outcome, and a failure at step 3
//! follows a write that did land ([`LedgerError::Unconfirmed`]). Both leave the movement
//! `pending` until [`LedgerAction::ReconcilePending`] resolves it, and no further
//! movement of that product is accepted meanwhile.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::actions::{LedgerAction, LedgerActionResult, ReconcileReport};
use super::transition::next_stock;
use super::LedgerError;
use crate::config::LedgerConfig;
use crate::framework::ActorEntity;
use crate::integrity::IntegrityChecker;
use crate::model::{
    MovementOutcome, MovementRequest, MovementStatus, ProductId, StockMovement,
};
use crate::store::{StockStore, StoreError, TimeoutStore};

/// Marker type for the per-product ledger actor.
pub struct StockLedger;

/// Shared by every per-product actor.
pub struct LedgerContext {
    pub store: Arc<dyn StockStore>,
    pub integrity: IntegrityChecker,
    pub config: LedgerConfig,
}

impl LedgerContext {
    /// Wraps `store` so every call is bounded by `config.storage_timeout()`.
    pub fn new(store: Arc<dyn StockStore>, config: LedgerConfig) -> Self {
        let store: Arc<dyn StockStore> = Arc::new(TimeoutStore::new(store, config.storage_timeout()));
        Self {
            integrity: IntegrityChecker::new(store.clone()),
            store,
            config,
        }
    }
}

#[async_trait]
impl ActorEntity for StockLedger {
    type Id = ProductId;
    type Action = LedgerAction;
    type ActionResult = LedgerActionResult;
    type Context = LedgerContext;
    type Error = LedgerError;

    async fn handle_action(
        id: &ProductId,
        action: LedgerAction,
        ctx: &LedgerContext,
    ) -> Result<LedgerActionResult, LedgerError> {
        match action {
            LedgerAction::ApplyMovement(request) => {
                apply_movement(*id, request, ctx).await.map(LedgerActionResult::ApplyMovement)
            }
            LedgerAction::ReconcilePending => {
                reconcile_pending(*id, ctx).await.map(LedgerActionResult::ReconcilePending)
            }
        }
    }
}

async fn apply_movement(
    product_id: ProductId,
    request: MovementRequest,
    ctx: &LedgerContext,
) -> Result<MovementOutcome, LedgerError> {
    if request.product_id != product_id {
        return Err(LedgerError::InvalidOperation(format!(
            "request for {} routed to {product_id}",
            request.product_id
        )));
    }
    if ctx.config.integrity_policy.applies_to(request.movement_type) {
        ctx.integrity.ensure(product_id).await?;
    } else {
        ctx.integrity.ensure_settled(product_id).await?;
    }

    let max_attempts = ctx.config.max_conflict_retries.saturating_add(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let product = ctx.store.get_product(product_id).await?;
        let new_stock = next_stock(
            request.movement_type,
            product.stock,
            request.quantity,
            product.minimum_stock,
        )?;

        let movement = ctx
            .store
            .insert_movement(StockMovement::pending(&request, product.stock, new_stock))
            .await?;

        match ctx
            .store
            .compare_and_set_stock(product_id, product.stock, new_stock)
            .await
        {
            Ok(product) => {
                let movement = ctx
                    .store
                    .set_movement_status(movement.id, MovementStatus::Completed)
                    .await
                    .map_err(|e| {
                        error!(%product_id, movement_id = %movement.id, error = %e,
                            "Stock written but movement left pending");
                        LedgerError::Unconfirmed {
                            product_id,
                            movement_id: movement.id,
                            reason: e.to_string(),
                        }
                    })?;
                return Ok(MovementOutcome { product, movement });
            }
            Err(StoreError::ConcurrentConflict {
                expected, actual, ..
            }) => {
                mark_failed(ctx, &movement).await;
                if attempt >= max_attempts {
                    return Err(LedgerError::ConcurrentConflict {
                        product_id,
                        attempts: attempt,
                    });
                }
                debug!(%product_id, attempt, expected, actual, "Stock changed underneath, retrying");
            }
            Err(e @ StoreError::Timeout { .. }) => {
                warn!(%product_id, movement_id = %movement.id, "Stock write outcome unknown, movement left pending");
                return Err(e.into());
            }
            Err(e) => {
                mark_failed(ctx, &movement).await;
                return Err(e.into());
            }
        }
    }
}

/// The product write never happened; record that.
async fn mark_failed(ctx: &LedgerContext, movement: &StockMovement) {
    if let Err(e) = ctx
        .store
        .set_movement_status(movement.id, MovementStatus::Failed)
        .await
    {
        error!(product_id = %movement.product_id, movement_id = %movement.id, error = %e,
            "Could not mark movement failed");
    }
}

/// Resolves pending movements against the records written after them.
///
/// Walks the product's movements newest first. A pending movement is completed when its
/// `new_stock` is what the next completed movement started from, or, with nothing
/// completed after it, what the product holds now. Anything else is failed. Stock is
/// never written here; a wrong guess is corrected with an `adjustment`.
async fn reconcile_pending(
    product_id: ProductId,
    ctx: &LedgerContext,
) -> Result<ReconcileReport, LedgerError> {
    let product = ctx.store.get_product(product_id).await?;
    let movements = ctx.store.history(product_id, usize::MAX).await?;

    // The stock the movement after the current one started from.
    let mut expected = product.stock;
    let mut report = ReconcileReport::default();
    for movement in movements {
        match movement.status {
            MovementStatus::Completed => expected = movement.previous_stock,
            MovementStatus::Failed => {}
            MovementStatus::Pending => {
                let status = if movement.new_stock == expected {
                    expected = movement.previous_stock;
                    report.completed += 1;
                    MovementStatus::Completed
                } else {
                    report.failed += 1;
                    MovementStatus::Failed
                };
                ctx.store.set_movement_status(movement.id, status).await?;
                debug!(%product_id, movement_id = %movement.id, %status, "Reconciled");
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntegrityPolicy;
    use crate::model::{CallerIdentity, MovementType, Product};
    use crate::store::mock::{MockStockStore, StoreOp};

    fn context(mock: &MockStockStore, config: LedgerConfig) -> LedgerContext {
        LedgerContext::new(Arc::new(mock.clone()), config)
    }

    fn seeded(stock: u32) -> MockStockStore {
        let mock = MockStockStore::new();
        mock.inner()
            .insert_product(Product::new(ProductId(1), "Kettle", 30.0, stock))
            .unwrap();
        mock
    }

    fn request(movement_type: MovementType, quantity: u32) -> MovementRequest {
        MovementRequest::new(
            ProductId(1),
            movement_type,
            quantity,
            CallerIdentity::new("seller-1", "seller"),
        )
    }

    #[tokio::test]
    async fn test_conflict_is_retried_then_succeeds() {
        let mock = seeded(10);
        mock.expect(StoreOp::CompareAndSetStock)
            .return_err(StoreError::ConcurrentConflict {
                product_id: ProductId(1),
                expected: 10,
                actual: 9,
            });
        let ctx = context(&mock, LedgerConfig::default());

        let outcome = apply_movement(ProductId(1), request(MovementType::Subtract, 4), &ctx)
            .await
            .unwrap();
        assert_eq!(outcome.product.stock, 6);

        let history = mock.inner().history(ProductId(1), 10).await.unwrap();
        let statuses: Vec<MovementStatus> = history.iter().map(|m| m.status).collect();
        assert_eq!(statuses, vec![MovementStatus::Completed, MovementStatus::Failed]);
        mock.verify();
    }

    #[tokio::test]
    async fn test_conflict_retries_are_bounded() {
        let mock = seeded(10);
        for _ in 0..3 {
            mock.expect(StoreOp::CompareAndSetStock)
                .return_err(StoreError::ConcurrentConflict {
                    product_id: ProductId(1),
                    expected: 10,
                    actual: 9,
                });
        }
        let config = LedgerConfig {
            max_conflict_retries: 2,
            ..LedgerConfig::default()
        };
        let ctx = context(&mock, config);

        let err = apply_movement(ProductId(1), request(MovementType::Add, 1), &ctx)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::ConcurrentConflict {
                product_id: ProductId(1),
                attempts: 3
            }
        );
        assert_eq!(mock.calls(StoreOp::CompareAndSetStock), 3);
        assert_eq!(mock.inner().get_product(ProductId(1)).await.unwrap().stock, 10);
        mock.verify();
    }

    #[tokio::test]
    async fn test_refused_movement_writes_nothing() {
        let mock = seeded(3);
        let ctx = context(&mock, LedgerConfig::default());

        let err = apply_movement(ProductId(1), request(MovementType::Sale, 5), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock { shortage: 2, .. }));
        assert_eq!(mock.calls(StoreOp::InsertMovement), 0);
        assert_eq!(mock.calls(StoreOp::CompareAndSetStock), 0);
    }

    #[tokio::test]
    async fn test_integrity_runs_before_business_rule() {
        let mock = seeded(10);
        let ctx = context(&mock, LedgerConfig::default());
        apply_movement(ProductId(1), request(MovementType::Set, 10), &ctx)
            .await
            .unwrap();
        mock.inner()
            .compare_and_set_stock(ProductId(1), 10, 2)
            .await
            .unwrap();

        // Would also be insufficient, but the mismatch is reported first.
        let err = apply_movement(ProductId(1), request(MovementType::Sale, 5), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Inconsistent { stock: 2, ledger_stock: 10, .. }));
    }

    #[tokio::test]
    async fn test_never_policy_skips_integrity() {
        let mock = seeded(10);
        let config = LedgerConfig {
            integrity_policy: IntegrityPolicy::Never,
            ..LedgerConfig::default()
        };
        let ctx = context(&mock, config);
        apply_movement(ProductId(1), request(MovementType::Set, 10), &ctx)
            .await
            .unwrap();
        mock.inner()
            .compare_and_set_stock(ProductId(1), 10, 8)
            .await
            .unwrap();

        let outcome = apply_movement(ProductId(1), request(MovementType::Sale, 5), &ctx)
            .await
            .unwrap();
        assert_eq!(outcome.product.stock, 3);
        assert_eq!(mock.calls(StoreOp::LatestCompletedMovement), 0);
    }

    #[tokio::test]
    async fn test_pending_movement_blocks_every_type_under_any_policy() {
        for policy in [IntegrityPolicy::Risky, IntegrityPolicy::Never] {
            let mock = seeded(10);
            let config = LedgerConfig {
                integrity_policy: policy,
                ..LedgerConfig::default()
            };
            let ctx = context(&mock, config);
            mock.inner()
                .insert_movement(StockMovement::pending(&request(MovementType::Add, 2), 10, 12))
                .await
                .unwrap();

            for movement_type in [MovementType::Add, MovementType::Subtract, MovementType::Set] {
                let err = apply_movement(ProductId(1), request(movement_type, 1), &ctx)
                    .await
                    .unwrap_err();
                assert_eq!(
                    err,
                    LedgerError::PendingExists {
                        product_id: ProductId(1),
                        pending: 1
                    }
                );
            }
            assert_eq!(mock.calls(StoreOp::CompareAndSetStock), 0);
        }
    }

    #[tokio::test]
    async fn test_failed_completion_flip_is_unconfirmed() {
        let mock = seeded(10);
        mock.expect(StoreOp::SetMovementStatus)
            .return_err(StoreError::Backend("connection reset".into()));
        let ctx = context(&mock, LedgerConfig::default());

        let err = apply_movement(ProductId(1), request(MovementType::Subtract, 4), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unconfirmed { product_id: ProductId(1), .. }));
        assert!(!err.is_retryable());

        assert_eq!(mock.inner().get_product(ProductId(1)).await.unwrap().stock, 6);
        assert_eq!(mock.inner().count_pending(ProductId(1)).await.unwrap(), 1);
        mock.verify();
    }

    #[tokio::test]
    async fn test_reconcile_completes_committed_and_fails_lost_writes() {
        let mock = seeded(10);
        let ctx = context(&mock, LedgerConfig::default());
        let store = mock.inner();

        // A write that reached the store but was never confirmed.
        let committed = store
            .insert_movement(StockMovement::pending(&request(MovementType::Subtract, 3), 10, 7))
            .await
            .unwrap();
        store.compare_and_set_stock(ProductId(1), 10, 7).await.unwrap();
        // A write that never reached the store.
        let lost = store
            .insert_movement(StockMovement::pending(&request(MovementType::Subtract, 1), 7, 6))
            .await
            .unwrap();

        let report = reconcile_pending(ProductId(1), &ctx).await.unwrap();
        assert_eq!(report, ReconcileReport { completed: 1, failed: 1 });

        let history = store.history(ProductId(1), 10).await.unwrap();
        let status_of = |id| history.iter().find(|m| m.id == id).map(|m| m.status);
        assert_eq!(status_of(committed.id), Some(MovementStatus::Completed));
        assert_eq!(status_of(lost.id), Some(MovementStatus::Failed));
        assert!(ctx.integrity.check(ProductId(1)).await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn test_reconcile_matches_pending_against_the_next_completed_movement() {
        let mock = seeded(10);
        let ctx = context(&mock, LedgerConfig::default());
        let store = mock.inner();

        // Landed but unconfirmed, then another process chained a completed write on it.
        let committed = store
            .insert_movement(StockMovement::pending(&request(MovementType::Subtract, 4), 10, 6))
            .await
            .unwrap();
        store.compare_and_set_stock(ProductId(1), 10, 6).await.unwrap();
        let later = store
            .insert_movement(StockMovement::pending(&request(MovementType::Subtract, 1), 6, 5))
            .await
            .unwrap();
        store.compare_and_set_stock(ProductId(1), 6, 5).await.unwrap();
        store
            .set_movement_status(later.id, MovementStatus::Completed)
            .await
            .unwrap();

        let report = reconcile_pending(ProductId(1), &ctx).await.unwrap();
        assert_eq!(report, ReconcileReport { completed: 1, failed: 0 });

        let history = store.history(ProductId(1), 10).await.unwrap();
        assert_eq!(history[1].id, committed.id);
        assert_eq!(history[1].status, MovementStatus::Completed);
        assert_eq!(history[1].new_stock, history[0].previous_stock);
        assert!(ctx.integrity.check(ProductId(1)).await.unwrap().is_consistent());
    }
}
