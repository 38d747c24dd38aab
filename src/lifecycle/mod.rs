//! # System Lifecycle & Orchestration
//!
//! Starting, wiring and stopping the ledger.
//!
//! ## Wiring
//!
//! [`InventorySystem::new`] takes a configuration and any [`StockStore`](crate::store::StockStore)
//! and builds, in order:
//!
//! 1. A [`TimeoutStore`](crate::store::TimeoutStore) around the store, so no storage
//!    call can hang a product actor.
//! 2. The [`ActorRegistry`](crate::framework::ActorRegistry) of per-product actors,
//!    sharing one [`LedgerContext`](crate::ledger::LedgerContext).
//! 3. The [`StockLedgerService`](crate::ledger::StockLedgerService) facade.
//! 4. The periodic low-stock scan, if `scan_interval_ms` is non-zero.
//!
//! Product actors are not started here. Each one is spawned on the first movement for
//! its product and evicted after `actor_idle_timeout_ms` without traffic.
//!
//! ## Graceful Shutdown
//!
//! 1. **Stop the scan** - the watch channel flips to `true`
//! 2. **Close the registry** - new movements get `ActorCommunication`
//! 3. **Actors drain** - queued movements still run to completion
//! 4. **Await completion** - every actor task is joined
//!
//! ## Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging for the whole system; see the
//! [`tracing`] module.

pub mod inventory_system;
pub mod tracing;

pub use self::inventory_system::*;
pub use self::tracing::*;
