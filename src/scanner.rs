//! # Low-Stock Scanner
//!
//! Read-only sweep for products at or below a stock threshold. Used on demand by the
//! ledger service and, when configured, on a timer by the inventory system.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::ledger::LedgerError;
use crate::model::Product;
use crate::store::StockStore;

#[derive(Clone)]
pub struct LowStockScanner {
    store: Arc<dyn StockStore>,
    default_threshold: u32,
}

impl LowStockScanner {
    pub fn new(store: Arc<dyn StockStore>, default_threshold: u32) -> Self {
        Self {
            store,
            default_threshold,
        }
    }

    pub fn default_threshold(&self) -> u32 {
        self.default_threshold
    }

    /// Accessible products with `stock <= threshold`, lowest stock first.
    pub async fn find_low_stock(&self, threshold: Option<u32>) -> Result<Vec<Product>, LedgerError> {
        let threshold = threshold.unwrap_or(self.default_threshold);
        Ok(self.store.low_stock_products(threshold).await?)
    }

    /// Runs a scan every `interval` with the default threshold until `shutdown` flips
    /// to `true` (or its sender is dropped). Each hit is logged as a warning.
    pub fn spawn_periodic(
        &self,
        interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let scanner = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => scanner.scan_once().await,
                }
            }
            debug!("Low-stock scan stopped");
        })
    }

    async fn scan_once(&self) {
        match self.find_low_stock(None).await {
            Ok(products) => {
                for product in &products {
                    warn!(
                        product_id = %product.id,
                        stock = product.stock,
                        threshold = self.default_threshold,
                        "Low stock"
                    );
                }
                debug!(hits = products.len(), "Low-stock scan done");
            }
            Err(e) => error!(error = %e, "Low-stock scan failed"),
        }
    }
}
