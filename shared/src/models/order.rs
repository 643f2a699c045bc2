//! Customer order models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Customer order status
///
/// Legal transitions:
///
/// ```text
/// PENDING ──► PAID ─────┐
///    │          │       │
///    ▼          ▼       ▼
/// PROCESSING ◄──┘    SHIPPED ──► DELIVERED
///    │    │             ▲
///    │    └─────────────┘
///    ▼
/// CANCELLED   (also reachable from PENDING and PAID)
/// ```
///
/// `DELIVERED` and `CANCELLED` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states admit no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Line items may only be mutated while the order is pending
    pub fn items_editable(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Customer order header
///
/// Line items are stored separately and reference the order by id;
/// `total_amount` is derived from them and recomputed after every item
/// mutation, never taken from caller input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerOrder {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    /// Set once at creation, immutable afterwards
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    /// Shipment tracking token, set on transition to SHIPPED
    pub tracking_number: Option<String>,
}

impl CustomerOrder {
    pub fn new(customer_name: impl Into<String>, customer_email: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            customer_name: customer_name.into(),
            customer_email: customer_email.into(),
            order_date: Utc::now(),
            status: OrderStatus::Pending,
            total_amount: Decimal::ZERO,
            tracking_number: None,
        }
    }
}

/// Order line item
///
/// `unit_price` is captured when the item is added and deliberately not
/// re-derived from the catalog later, so a catalog price change never
/// retroactively alters an order total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: String,
    /// Owning order reference
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl OrderItem {
    pub fn new(
        order_id: impl Into<String>,
        product_id: impl Into<String>,
        quantity: i64,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Create-order payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderDraft {
    #[validate(length(min = 1, message = "Customer name cannot be empty"))]
    pub customer_name: String,
    #[validate(email(message = "Customer email is not valid"))]
    pub customer_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_starts_pending_with_zero_total() {
        let order = CustomerOrder::new("Alice", "alice@example.com");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, Decimal::ZERO);
        assert!(order.tracking_number.is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_items_editable_only_while_pending() {
        assert!(OrderStatus::Pending.items_editable());
        assert!(!OrderStatus::Paid.items_editable());
        assert!(!OrderStatus::Processing.items_editable());
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem::new("order-1", "prod-1", 3, Decimal::new(1250, 2));
        assert_eq!(item.line_total(), Decimal::new(3750, 2));
    }

    #[test]
    fn test_draft_validation() {
        use validator::Validate;

        let draft = OrderDraft {
            customer_name: "Alice".to_string(),
            customer_email: "alice@example.com".to_string(),
        };
        assert!(draft.validate().is_ok());

        let draft = OrderDraft {
            customer_name: "".to_string(),
            customer_email: "not-an-email".to_string(),
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
    }
}
