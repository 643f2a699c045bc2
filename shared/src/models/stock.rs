//! Stock projection model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Product;

/// Current-quantity projection for a single product
///
/// One record per product, created lazily when the first movement is
/// recorded. The movement log is the source of truth; this row must always
/// equal the sum of the product's movement quantities and is only ever
/// mutated together with a movement append, inside the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stock {
    /// Product reference (unique per record)
    pub product_id: String,
    pub quantity_available: i64,
    pub last_updated: DateTime<Utc>,
}

impl Stock {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            quantity_available: 0,
            last_updated: Utc::now(),
        }
    }

    /// Check if stock is at or below the product's reorder level
    ///
    /// A reorder level of zero disables the alert for the product.
    pub fn needs_reorder(&self, product: &Product) -> bool {
        product.reorder_level > 0 && self.quantity_available <= product.reorder_level
    }
}
