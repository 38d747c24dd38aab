//! # Stock Ledger Demo
//!
//! Seeds one product and walks it through a purchase, two sales and a stock-take
//! adjustment, then prints the audit trail.

use std::sync::Arc;

use stock_ledger::config::LedgerConfig;
use stock_ledger::ledger::LedgerError;
use stock_ledger::lifecycle::{setup_tracing, InventorySystem};
use stock_ledger::model::{CallerIdentity, MovementRequest, MovementType, Product, ProductId};
use stock_ledger::store::InMemoryStockStore;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = LedgerConfig::load()?;
    info!(?config, "Starting stock ledger demo");

    let store = Arc::new(InMemoryStockStore::new());
    let product_id = ProductId(1);
    store.insert_product(Product::new(product_id, "Espresso Machine", 249.0, 100).with_minimum_stock(5))?;

    let system = InventorySystem::new(config, store);
    let seller = CallerIdentity::new("seller-42", "seller");
    let admin = CallerIdentity::new("admin-1", "admin");

    let steps = [
        (MovementType::Purchase, 50, &admin, "supplier delivery"),
        (MovementType::Sale, 20, &seller, "order #1001"),
        (MovementType::Sale, 15, &seller, "order #1002"),
        (MovementType::Adjustment, 110, &admin, "stock take"),
        // Refused: would leave 0, below the floor of 5.
        (MovementType::Sale, 110, &seller, "bulk order"),
    ];

    let span = tracing::info_span!("movements", %product_id);
    async {
        for (movement_type, quantity, caller, reason) in steps {
            let request = MovementRequest::new(product_id, movement_type, quantity, caller.clone())
                .with_reason(reason);
            match system.ledger.apply_movement(request).await {
                Ok(outcome) => info!(
                    %movement_type,
                    quantity,
                    stock = outcome.product.stock,
                    "Step done"
                ),
                Err(LedgerError::InsufficientStock { shortage, .. }) => {
                    info!(%movement_type, quantity, shortage, "Step refused as expected")
                }
                Err(e) => error!(error = %e, "Step failed"),
            }
        }
    }
    .instrument(span)
    .await;

    for movement in system.ledger.get_history(product_id, None).await? {
        info!(
            movement_type = %movement.movement_type,
            previous = movement.previous_stock,
            new = movement.new_stock,
            status = %movement.status,
            "History"
        );
    }
    for stats in system.ledger.get_statistics(product_id).await? {
        info!(movement_type = %stats.movement_type, count = stats.count, total = stats.total_quantity, "Statistics");
    }
    info!(status = ?system.ledger.check_integrity(product_id).await?, "Integrity");

    system.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
