//! Data models
//!
//! Shared between the fulfillment engine and frontends (via API).
//! All IDs are `String` (UUID v4); monetary values are `rust_decimal::Decimal`.

pub mod movement;
pub mod order;
pub mod product;
pub mod stock;
pub mod supplier_order;

// Re-exports
pub use movement::*;
pub use order::*;
pub use product::*;
pub use stock::*;
pub use supplier_order::*;
