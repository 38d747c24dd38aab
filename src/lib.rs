#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Stock Ledger
//!
//! > **An auditable, concurrency-safe stock ledger for a marketplace backend.**
//!
//! Every change to a product's stock goes through this crate. Each change is validated,
//! applied with a conditional write, and recorded as an immutable [`StockMovement`](model::StockMovement).
//! At rest, a product's stock always equals the `new_stock` of its latest completed
//! movement; the [`integrity`] checker refuses to act when it does not.
//!
//! ## 🏗️ Design
//!
//! ### One actor per product
//!
//! Writes for the same product are serialized by a per-product actor (a Tokio task
//! draining a mailbox); writes for different products run in parallel. Actors are
//! spawned on demand and evicted when idle, so memory follows the set of recently
//! active products. There is no global lock.
//!
//! ### Compare-and-set underneath
//!
//! The actor only serializes writers inside one process. The store's
//! `compare_and_set_stock` (`UPDATE stock WHERE stock = expected`) catches the rest,
//! and the ledger retries a bounded number of times before reporting
//! [`ConcurrentConflict`](ledger::LedgerError::ConcurrentConflict).
//!
//! ### Pending, completed, failed
//!
//! A movement is written `pending` before the stock write and flipped afterwards. A
//! storage timeout leaves it `pending`; the integrity check then refuses further risky
//! movements until [`reconcile_pending`](ledger::StockLedgerService::reconcile_pending)
//! resolves it.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! The generic keyed-actor plumbing: [`ActorEntity`](framework::ActorEntity),
//! [`KeyedActor`](framework::KeyedActor), [`ActorRegistry`](framework::ActorRegistry).
//!
//! ### 2. The Ledger ([`ledger`])
//! The stock formula, the write protocol and the [`StockLedgerService`](ledger::StockLedgerService)
//! callers use.
//!
//! ### 3. Guards and Sweeps ([`integrity`], [`scanner`])
//! The pre-flight integrity check and the low-stock scanner.
//!
//! ### 4. Storage ([`store`])
//! The [`StockStore`](store::StockStore) boundary, an in-memory backend, the timeout
//! decorator and a fault-injecting mock for tests.
//!
//! ### 5. The Orchestrator ([`lifecycle`])
//! [`InventorySystem`](lifecycle::InventorySystem) wires everything and shuts it down.
//!
//! ### 6. The Edges ([`api`], [`config`], [`model`])
//! Request/response shapes, configuration and the data types.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run
//!
//! # Run the tests
//! cargo test
//! ```

pub mod api;
pub mod config;
pub mod framework;
pub mod integrity;
pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod scanner;
pub mod store;
