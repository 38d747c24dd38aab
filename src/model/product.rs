//! Represents a product as seen by the stock ledger.
//!
//! # Ownership
//! The product catalog owns creation, deletion and the descriptive fields
//! (`name`, `price`, `is_accessible`). The ledger only ever writes `stock`, and only
//! through [`StockStore::compare_and_set_stock`](crate::store::StockStore::compare_and_set_stock).
use serde::{Deserialize, Serialize};

use std::fmt::Display;
use std::str::FromStr;

/// Type-safe identifier for Products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub u32);

impl From<u32> for ProductId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "product_{}", self.0)
    }
}

/// Accepts both the display form (`product_7`) and a bare number (`7`), which is
/// what shows up in `/products/:id` paths.
impl FromStr for ProductId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("product_").unwrap_or(s);
        raw.parse::<u32>().map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub stock: u32,
    /// Floor enforced by `sale` and `subtract` movements.
    pub minimum_stock: u32,
    /// Inaccessible products are never reported as low stock.
    pub is_accessible: bool,
}

impl Product {
    /// Creates a new accessible Product with no stock floor.
    ///
    /// # Arguments
    /// * `id` - Unique identifier assigned by the catalog
    /// * `name` - Product name
    /// * `price` - Product price
    /// * `stock` - Opening stock level
    pub fn new(id: ProductId, name: impl Into<String>, price: f64, stock: u32) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            stock,
            minimum_stock: 0,
            is_accessible: true,
        }
    }

    pub fn with_minimum_stock(mut self, minimum_stock: u32) -> Self {
        self.minimum_stock = minimum_stock;
        self
    }

    pub fn with_accessible(mut self, is_accessible: bool) -> Self {
        self.is_accessible = is_accessible;
        self
    }
}
