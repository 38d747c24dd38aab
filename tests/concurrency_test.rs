//! Races on the same product, run many times on a multi-threaded runtime.

use std::sync::Arc;

use stock_ledger::config::LedgerConfig;
use stock_ledger::ledger::LedgerError;
use stock_ledger::lifecycle::InventorySystem;
use stock_ledger::model::{
    CallerIdentity, MovementRequest, MovementStatus, MovementType, Product, ProductId,
};
use stock_ledger::store::{InMemoryStockStore, StockStore};

const ROUNDS: usize = 50;

fn subtract(product_id: ProductId, quantity: u32, user: &str) -> MovementRequest {
    MovementRequest::new(
        product_id,
        MovementType::Subtract,
        quantity,
        CallerIdentity::new(user, "seller"),
    )
}

fn store_with(products: &[(u32, u32)]) -> Arc<InMemoryStockStore> {
    let store = Arc::new(InMemoryStockStore::new());
    for &(id, stock) in products {
        store
            .insert_product(Product::new(ProductId(id), format!("Item {id}"), 5.0, stock))
            .unwrap();
    }
    store
}

/// Stock 50, four concurrent `subtract(20)`: two succeed, two are refused, never
/// negative.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_subtracts_never_overdraw() {
    for round in 0..ROUNDS {
        let store = store_with(&[(1, 50)]);
        let system = InventorySystem::new(LedgerConfig::default(), store.clone());

        let mut handles = Vec::new();
        for writer in 0..4 {
            let ledger = system.ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .apply_movement(subtract(ProductId(1), 20, &format!("seller-{writer}")))
                    .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(outcome) => {
                    succeeded += 1;
                    assert!(outcome.product.stock == 30 || outcome.product.stock == 10);
                }
                Err(LedgerError::InsufficientStock {
                    current_stock,
                    requested,
                    shortage,
                    ..
                }) => {
                    assert_eq!((current_stock, requested, shortage), (10, 20, 10));
                }
                Err(e) => panic!("round {round}: unexpected error {e}"),
            }
        }
        assert_eq!(succeeded, 2, "round {round}");
        assert_eq!(store.get_product(ProductId(1)).await.unwrap().stock, 10);

        let history = store.history(ProductId(1), 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|m| m.status == MovementStatus::Completed));
        assert_eq!(history[1].new_stock, history[0].previous_stock);

        system.shutdown().await.unwrap();
    }
}

/// Writers on different products do not interfere with each other.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_products_are_updated_independently() {
    let products: Vec<(u32, u32)> = (1..=8).map(|id| (id, 100)).collect();
    let store = store_with(&products);
    let system = InventorySystem::new(LedgerConfig::default(), store.clone());

    let mut handles = Vec::new();
    for (id, _) in &products {
        for n in 0..10 {
            let ledger = system.ledger.clone();
            let product_id = ProductId(*id);
            handles.push(tokio::spawn(async move {
                let movement_type = if n % 2 == 0 {
                    MovementType::Purchase
                } else {
                    MovementType::Sale
                };
                let request = MovementRequest::new(
                    product_id,
                    movement_type,
                    3,
                    CallerIdentity::new("ops", "admin"),
                );
                ledger.apply_movement(request).await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for (id, _) in &products {
        let product_id = ProductId(*id);
        // Five purchases and five sales of 3 each.
        assert_eq!(store.get_product(product_id).await.unwrap().stock, 100);

        let history = store.history(product_id, 20).await.unwrap();
        assert_eq!(history.len(), 10);
        for pair in history.windows(2) {
            assert_eq!(pair[1].new_stock, pair[0].previous_stock);
        }
        assert!(system.ledger.check_integrity(product_id).await.unwrap().is_consistent());
    }
    assert_eq!(system.active_products(), products.len());

    system.shutdown().await.unwrap();
}

/// Two independent systems sharing one store are kept honest by the compare-and-set.
///
/// A movement in flight on one side shows up as `pending` to the other, which refuses
/// rather than chain on it. So at least one and at most two writers get through.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_systems_sharing_a_store_never_overdraw() {
    for round in 0..ROUNDS {
        let store = store_with(&[(1, 50)]);
        let left = InventorySystem::new(LedgerConfig::default(), store.clone());
        let right = InventorySystem::new(LedgerConfig::default(), store.clone());

        let mut handles = Vec::new();
        for writer in 0..4 {
            let ledger = if writer % 2 == 0 {
                left.ledger.clone()
            } else {
                right.ledger.clone()
            };
            handles.push(tokio::spawn(async move {
                ledger
                    .apply_movement(subtract(ProductId(1), 20, &format!("seller-{writer}")))
                    .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(LedgerError::InsufficientStock { .. } | LedgerError::PendingExists { .. }) => {}
                Err(e) => panic!("round {round}: unexpected error {e}"),
            }
        }
        let stock = store.get_product(ProductId(1)).await.unwrap().stock;
        assert!((1..=2).contains(&succeeded), "round {round}: {succeeded} succeeded");
        assert_eq!(stock, 50 - 20 * succeeded, "round {round}");

        // Lost races are on record as failed, never as completed.
        let history = store.history(ProductId(1), 50).await.unwrap();
        let completed: Vec<_> = history
            .iter()
            .filter(|m| m.status == MovementStatus::Completed)
            .collect();
        assert_eq!(completed.len() as u32, succeeded);
        assert!(history.iter().all(|m| m.status != MovementStatus::Pending));

        left.shutdown().await.unwrap();
        right.shutdown().await.unwrap();
    }
}
