//! Fulfillment engine errors

use crate::ledger::LedgerError;
use crate::storage::StorageError;
use shared::models::{OrderStatus, SupplierOrderStatus};
use thiserror::Error;

/// Errors surfaced by order and supplier-order operations
///
/// Everything except `Storage` is a recoverable, caller-visible condition
/// carrying enough context for a user-facing message. `Storage` wraps
/// unexpected persistence failures and should be logged and surfaced
/// generically, not interpreted.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order item not found: {0}")]
    ItemNotFound(String),

    #[error("Supplier order not found: {0}")]
    SupplierOrderNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("No stock record for product: {0}")]
    StockNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Invalid supplier order transition from {from} to {to}")]
    InvalidSupplierTransition {
        from: SupplierOrderStatus,
        to: SupplierOrderStatus,
    },

    #[error("Order items cannot be modified in status {0}")]
    ItemNotEditable(OrderStatus),

    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type FulfillmentResult<T> = Result<T, FulfillmentError>;

impl From<LedgerError> for FulfillmentError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::ProductNotFound(id) => FulfillmentError::ProductNotFound(id),
            LedgerError::StockNotFound(id) => FulfillmentError::StockNotFound(id),
            LedgerError::InvalidInput(msg) => FulfillmentError::InvalidInput(msg),
            LedgerError::InsufficientStock {
                product_id,
                requested,
                available,
            } => FulfillmentError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            LedgerError::Storage(e) => FulfillmentError::Storage(e),
        }
    }
}
