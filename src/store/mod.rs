//! The Stock Store: persistence boundary for product stock and the movement ledger.
//!
//! - [`StockStore`] is the trait every backend implements.
//! - [`InMemoryStockStore`] is the in-process backend used by the demo and the tests.
//! - [`TimeoutStore`] bounds every call with the configured storage timeout.
//! - [`mock::MockStockStore`] injects faults for failure-path tests.

mod error;
mod in_memory;
pub mod mock;
mod timeout;
mod traits;

pub use error::StoreError;
pub use in_memory::InMemoryStockStore;
pub use timeout::TimeoutStore;
pub use traits::StockStore;
