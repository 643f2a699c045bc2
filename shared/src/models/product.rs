//! Product Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product entity
///
/// Owned by the product catalog; the fulfillment core reads it but never
/// mutates it. `reorder_level` of zero opts the product out of reorder
/// alerts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Stock-keeping unit, unique across the catalog
    pub sku: String,
    pub unit_price: Decimal,
    /// Quantity at or below which the product is flagged for replenishment
    pub reorder_level: i64,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        sku: impl Into<String>,
        unit_price: Decimal,
        reorder_level: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            sku: sku.into(),
            unit_price,
            reorder_level,
            created_at: Utc::now(),
        }
    }

    /// Whether this product participates in reorder alerting
    pub fn reorder_enabled(&self) -> bool {
        self.reorder_level > 0
    }
}
