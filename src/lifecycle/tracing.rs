//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging with the `tracing` crate.
//!
//! ## Configuration
//!
//! Compact format, no module prefix (`with_target(false)`), level from `RUST_LOG`
//! (default `info`).
//!
//! ```bash
//! RUST_LOG=info cargo run                       # movements and lifecycle
//! RUST_LOG=debug cargo run                      # plus actor spawns, evictions, retries
//! RUST_LOG=stock_ledger::framework=debug cargo run
//! ```
//!
//! ## What Gets Logged
//!
//! | Event | Level |
//! |---|---|
//! | Movement applied, reconciliation done | `INFO` |
//! | Refused movement (insufficient stock, invalid operation, conflict) | `WARN` |
//! | Low-stock hit from the periodic scan | `WARN` |
//! | Integrity refusal, storage failure or timeout | `ERROR` |
//! | Actor spawn, idle eviction, retry, full request payloads | `DEBUG` |
//!
//! Service entry points are wrapped in spans carrying `product_id`; actor lines carry it
//! as `id`. Either way a movement's lines can be filtered by product:
//!
//! ```text
//! INFO apply_movement{product_id=product_1 movement_type=sale}: Movement applied previous_stock=150 new_stock=130
//! WARN apply_movement{product_id=product_1 movement_type=sale}: Movement refused code="INSUFFICIENT_STOCK"
//! ```

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Calling it again (e.g. from several tests) is a
/// no-op.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
