use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::LedgerConfig;
use crate::framework::{ActorRegistry, RegistryConfig};
use crate::ledger::{LedgerContext, LedgerError, StockLedger, StockLedgerService};
use crate::store::StockStore;

/// The runtime orchestrator for the stock ledger.
///
/// `InventorySystem` is responsible for:
/// - **Wiring**: wrapping the store with the storage timeout and handing it to the
///   per-product actor registry
/// - **Background work**: the periodic low-stock scan, when `scan_interval_ms > 0`
/// - **Shutdown**: stopping the scan and draining every product actor
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemoryStockStore::new());
/// let system = InventorySystem::new(LedgerConfig::load()?, store);
///
/// system.ledger.apply_movement(request).await?;
///
/// system.shutdown().await?;
/// ```
pub struct InventorySystem {
    /// Entry point for every ledger operation.
    pub ledger: StockLedgerService,

    registry: Arc<ActorRegistry<StockLedger>>,
    scan_shutdown: watch::Sender<bool>,
    scan_handle: Option<JoinHandle<()>>,
}

impl InventorySystem {
    /// Builds the system. Must be called from within a Tokio runtime when the periodic
    /// scan is enabled.
    pub fn new(config: LedgerConfig, store: Arc<dyn StockStore>) -> Self {
        let registry_config = RegistryConfig {
            mailbox_capacity: config.mailbox_capacity,
            idle_timeout: config.actor_idle_timeout(),
        };
        let scan_interval = config.scan_interval();

        let registry = Arc::new(ActorRegistry::new(
            LedgerContext::new(store, config),
            registry_config,
        ));
        let ledger = StockLedgerService::new(registry.clone());

        let (scan_shutdown, scan_rx) = watch::channel(false);
        let scan_handle =
            scan_interval.map(|interval| ledger.scanner().spawn_periodic(interval, scan_rx));

        info!(
            scan = scan_handle.is_some(),
            "Inventory system started"
        );
        Self {
            ledger,
            registry,
            scan_shutdown,
            scan_handle,
        }
    }

    /// Products that currently have a live actor.
    pub fn active_products(&self) -> usize {
        self.registry.len()
    }

    /// Stops the scan, lets every product actor finish its queue and waits for all
    /// tasks.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if everything stopped cleanly
    /// - `Err(LedgerError::ActorCommunication)` if the scan task panicked
    pub async fn shutdown(self) -> Result<(), LedgerError> {
        info!("Shutting down inventory system...");

        // The scan may already be gone; then there is nobody to tell.
        let _ = self.scan_shutdown.send(true);
        if let Some(handle) = self.scan_handle {
            if let Err(e) = handle.await {
                error!("Scan task failed: {:?}", e);
                return Err(LedgerError::ActorCommunication(format!("scan task failed: {e}")));
            }
        }

        self.registry.shutdown().await;

        info!("Inventory system shutdown complete.");
        Ok(())
    }
}
