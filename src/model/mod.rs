//! Pure data structures shared by the store, the ledger actor and the API boundary.

pub mod movement;
pub mod product;
pub mod user;

pub use movement::*;
pub use product::*;
pub use user::*;
