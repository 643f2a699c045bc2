//! Supplier order models
//!
//! Supplier orders are the replenishment side of the ledger: receiving one
//! applies a positive movement per line item. Their lifecycle is
//! deliberately small — `Placed → {Completed, Cancelled}` — because only
//! the receipt step touches stock.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Supplier order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplierOrderStatus {
    #[default]
    Placed,
    Completed,
    Cancelled,
}

impl std::fmt::Display for SupplierOrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SupplierOrderStatus::Placed => "PLACED",
            SupplierOrderStatus::Completed => "COMPLETED",
            SupplierOrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Supplier order header
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplierOrder {
    pub id: String,
    pub supplier_name: String,
    pub order_date: DateTime<Utc>,
    pub status: SupplierOrderStatus,
    pub total_amount: Decimal,
    pub expected_delivery: Option<NaiveDate>,
}

impl SupplierOrder {
    pub fn new(supplier_name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            supplier_name: supplier_name.into(),
            order_date: Utc::now(),
            status: SupplierOrderStatus::Placed,
            total_amount: Decimal::ZERO,
            expected_delivery: None,
        }
    }
}

/// Supplier order line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplierOrderItem {
    pub id: String,
    /// Owning supplier order reference
    pub supplier_order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost: Decimal,
}

impl SupplierOrderItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_cost * Decimal::from(self.quantity)
    }
}

/// Create-supplier-order payload
///
/// Line items are fixed at creation; there is no edit phase.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SupplierOrderDraft {
    #[validate(length(min = 1, message = "Supplier name cannot be empty"))]
    pub supplier_name: String,
    #[validate(length(min = 1, message = "Supplier order needs at least one line"))]
    pub lines: Vec<SupplierLineDraft>,
    pub expected_delivery: Option<NaiveDate>,
}

/// One line of a supplier order draft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierLineDraft {
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost: Decimal,
}
