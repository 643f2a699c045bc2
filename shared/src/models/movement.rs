//! Stock movement model
//!
//! Movements are append-only: corrections are made by appending an
//! offsetting movement, never by editing or deleting history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Movement type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Purchase,
    Sale,
    Adjustment,
    Return,
    CustomerOrder,
    SupplierOrder,
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MovementType::Purchase => "PURCHASE",
            MovementType::Sale => "SALE",
            MovementType::Adjustment => "ADJUSTMENT",
            MovementType::Return => "RETURN",
            MovementType::CustomerOrder => "CUSTOMER_ORDER",
            MovementType::SupplierOrder => "SUPPLIER_ORDER",
        };
        f.write_str(s)
    }
}

/// A signed quantity-change event recorded against a product
///
/// Immutable once created. `sequence` is assigned by storage from a global
/// counter, so log order matches commit order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockMovement {
    /// Global, monotonically increasing sequence number
    pub sequence: u64,
    /// Product reference
    pub product_id: String,
    pub movement_type: MovementType,
    /// Signed quantity delta (never zero)
    pub quantity: i64,
    /// Cross-reference to the originating order, if any
    pub reference_id: Option<String>,
    /// Assigned inside the write transaction, immediately before commit
    pub movement_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Query filter for the movement log
///
/// All criteria are optional and combined with AND. Results are returned
/// newest first.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub product_id: Option<String>,
    pub movement_type: Option<MovementType>,
    pub reference_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl MovementFilter {
    pub fn for_product(product_id: impl Into<String>) -> Self {
        Self {
            product_id: Some(product_id.into()),
            ..Default::default()
        }
    }

    pub fn for_reference(reference_id: impl Into<String>) -> Self {
        Self {
            reference_id: Some(reference_id.into()),
            ..Default::default()
        }
    }

    /// Check a movement against every set criterion
    pub fn matches(&self, movement: &StockMovement) -> bool {
        if let Some(pid) = &self.product_id
            && *pid != movement.product_id
        {
            return false;
        }
        if let Some(mt) = self.movement_type
            && mt != movement.movement_type
        {
            return false;
        }
        if let Some(rid) = &self.reference_id
            && movement.reference_id.as_deref() != Some(rid.as_str())
        {
            return false;
        }
        if let Some(from) = self.from
            && movement.movement_date < from
        {
            return false;
        }
        if let Some(to) = self.to
            && movement.movement_date > to
        {
            return false;
        }
        true
    }
}
