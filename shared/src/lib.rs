//! Shared domain types for the supply-chain core
//!
//! Common types used by the fulfillment engine and by any transport layer
//! wrapped around it: products, stock records, stock movements, customer
//! orders and supplier orders.

pub mod models;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use models::{
    CustomerOrder, MovementFilter, MovementType, OrderDraft, OrderItem, OrderStatus, Product,
    Stock, StockMovement, SupplierLineDraft, SupplierOrder, SupplierOrderDraft, SupplierOrderItem,
    SupplierOrderStatus,
};
