//! Fulfillment Engine - inventory ledger and order fulfillment core
//!
//! # Architecture
//!
//! ```text
//! fulfillment-engine/src/
//! ├── storage/       # redb tables, transactions (single write boundary)
//! ├── ledger         # stock projection + append-only movement log
//! ├── fulfillment/   # order state machine, stock commitment/reversal
//! ├── reorder        # read-only replenishment projection
//! ├── catalog        # product catalog collaborator trait
//! ├── config         # environment-driven configuration
//! └── utils/         # logging setup
//! ```
//!
//! # Data Flow
//!
//! 1. A caller asks `FulfillmentEngine` for an order-status change
//! 2. The engine validates the transition against the state machine
//! 3. Transitions that move physical stock record movements through
//!    `StockLedger` and update the quantity projection, all inside one
//!    write transaction
//! 4. The new order status is persisted in the same transaction
//! 5. `ReorderAdvisor` is polled independently and never writes
//!
//! The ledger invariant — a product's available quantity always equals the
//! sum of its movement history — holds across every path, including
//! failures, because the projection and the log are only written together.

pub mod catalog;
pub mod config;
pub mod fulfillment;
pub mod ledger;
pub mod reorder;
pub mod storage;
pub mod utils;

// Re-export public types
pub use catalog::{InMemoryProductCatalog, ProductCatalog};
pub use config::EngineConfig;
pub use fulfillment::{
    FulfillmentEngine, FulfillmentError, FulfillmentResult, OrderDetail, SupplierOrderDetail,
};
pub use ledger::{LedgerError, LedgerResult, NewMovement, ProjectionAudit, StockLedger};
pub use reorder::{ReorderAdvisor, ReorderCandidate};
pub use storage::{InventoryStorage, StorageError, StorageResult};

// Re-export shared domain types for convenience
pub use shared::models::{
    CustomerOrder, MovementFilter, MovementType, OrderDraft, OrderItem, OrderStatus, Product,
    Stock, StockMovement, SupplierLineDraft, SupplierOrder, SupplierOrderDraft, SupplierOrderItem,
    SupplierOrderStatus,
};
