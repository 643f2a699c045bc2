//! Order fulfillment engine
//!
//! Orchestrates order-status transitions and the stock effects tied to
//! them. Every transition that touches the ledger runs inside one write
//! transaction covering the status check, the per-item availability
//! pre-flight, the movement appends, and the status write — so an order
//! either commits completely or not at all.
//!
//! # Transition Flow
//!
//! ```text
//! transition_status(order_id, target)
//!     ├─ 1. Begin write transaction
//!     ├─ 2. Load order, check the transition table
//!     ├─ 3. Stock side effects
//!     │      ├─ commitment: retry guard → pre-flight all items → debit each
//!     │      ├─ cancellation: reverse each prior commitment movement
//!     │      └─ shipment: record tracking token
//!     ├─ 4. Store new status
//!     └─ 5. Commit
//! ```

mod error;
pub mod transitions;

pub use error::{FulfillmentError, FulfillmentResult};

use crate::catalog::ProductCatalog;
use crate::ledger::{NewMovement, StockLedger};
use crate::storage::{InventoryStorage, StorageError};
use chrono::{DateTime, Utc};
use redb::WriteTransaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{
    CustomerOrder, MovementType, OrderDraft, OrderItem, OrderStatus, SupplierOrder,
    SupplierOrderDraft, SupplierOrderItem, SupplierOrderStatus,
};
use std::sync::Arc;
use validator::Validate;

/// An order header together with its line items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetail {
    pub order: CustomerOrder,
    pub items: Vec<OrderItem>,
}

/// A supplier order header together with its lines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplierOrderDetail {
    pub order: SupplierOrder,
    pub items: Vec<SupplierOrderItem>,
}

/// Order total as the sum of line totals
///
/// The single place the total is derived; callers never supply it.
pub fn recompute_total(items: &[OrderItem]) -> Decimal {
    items.iter().map(|i| i.line_total()).sum()
}

/// The fulfillment engine
///
/// Cheap to clone; clones share storage, ledger, and catalog.
#[derive(Clone)]
pub struct FulfillmentEngine {
    storage: InventoryStorage,
    ledger: StockLedger,
    catalog: Arc<dyn ProductCatalog>,
}

impl FulfillmentEngine {
    pub fn new(storage: InventoryStorage, catalog: Arc<dyn ProductCatalog>) -> Self {
        let ledger = StockLedger::new(storage.clone(), catalog.clone());
        Self {
            storage,
            ledger,
            catalog,
        }
    }

    /// The stock ledger sharing this engine's storage
    pub fn ledger(&self) -> &StockLedger {
        &self.ledger
    }

    // ========== Order Lifecycle ==========

    /// Create a new order in `Pending` with no items and a zero total
    pub fn create_order(&self, draft: OrderDraft) -> FulfillmentResult<CustomerOrder> {
        draft
            .validate()
            .map_err(|e| FulfillmentError::InvalidInput(e.to_string()))?;

        let order = CustomerOrder::new(draft.customer_name, draft.customer_email);
        let txn = self.storage.begin_write()?;
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id = %order.id, "order created");
        Ok(order)
    }

    /// Add a line item to a pending order
    ///
    /// Adding a product already on the order increments the existing line
    /// instead of duplicating it. When `unit_price` is not given, the
    /// current catalog price is captured; either way the captured price is
    /// frozen on the line from then on.
    pub fn add_item(
        &self,
        order_id: &str,
        product_id: &str,
        quantity: i64,
        unit_price: Option<Decimal>,
    ) -> FulfillmentResult<OrderItem> {
        if quantity <= 0 {
            return Err(FulfillmentError::InvalidInput(
                "quantity must be greater than zero".to_string(),
            ));
        }
        let product = self
            .catalog
            .get_product(product_id)
            .ok_or_else(|| FulfillmentError::ProductNotFound(product_id.to_string()))?;
        let unit_price = unit_price.unwrap_or(product.unit_price);
        if unit_price <= Decimal::ZERO {
            return Err(FulfillmentError::InvalidInput(
                "unit price must be greater than zero".to_string(),
            ));
        }

        let txn = self.storage.begin_write()?;
        let order = self.load_editable_order(&txn, order_id)?;

        let existing = self
            .storage
            .items_for_order_txn(&txn, order_id)?
            .into_iter()
            .find(|i| i.product_id == product_id);

        let item = match existing {
            Some(mut item) => {
                item.quantity += quantity;
                item
            }
            None => OrderItem::new(order_id, product_id, quantity, unit_price),
        };
        self.storage.store_item(&txn, &item)?;
        self.store_recomputed_total(&txn, order)?;
        txn.commit().map_err(StorageError::from)?;

        Ok(item)
    }

    /// Change the quantity of an existing line item
    pub fn update_item_quantity(
        &self,
        order_id: &str,
        item_id: &str,
        quantity: i64,
    ) -> FulfillmentResult<OrderItem> {
        if quantity <= 0 {
            return Err(FulfillmentError::InvalidInput(
                "quantity must be greater than zero".to_string(),
            ));
        }

        let txn = self.storage.begin_write()?;
        let order = self.load_editable_order(&txn, order_id)?;

        let mut item = self
            .storage
            .items_for_order_txn(&txn, order_id)?
            .into_iter()
            .find(|i| i.id == item_id)
            .ok_or_else(|| FulfillmentError::ItemNotFound(item_id.to_string()))?;
        item.quantity = quantity;
        self.storage.store_item(&txn, &item)?;
        self.store_recomputed_total(&txn, order)?;
        txn.commit().map_err(StorageError::from)?;

        Ok(item)
    }

    /// Remove a line item from a pending order
    pub fn remove_item(&self, order_id: &str, item_id: &str) -> FulfillmentResult<()> {
        let txn = self.storage.begin_write()?;
        let order = self.load_editable_order(&txn, order_id)?;

        let exists = self
            .storage
            .items_for_order_txn(&txn, order_id)?
            .iter()
            .any(|i| i.id == item_id);
        if !exists {
            return Err(FulfillmentError::ItemNotFound(item_id.to_string()));
        }
        self.storage.remove_item(&txn, order_id, item_id)?;
        self.store_recomputed_total(&txn, order)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    /// Move an order to a new status, applying any stock side effects
    pub fn transition_status(
        &self,
        order_id: &str,
        target: OrderStatus,
    ) -> FulfillmentResult<CustomerOrder> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;
        let from = order.status;

        if !transitions::is_legal(from, target) {
            return Err(FulfillmentError::InvalidTransition { from, to: target });
        }

        if transitions::commits_stock(from, target) {
            self.commit_stock(&txn, &order)?;
        }
        if target == OrderStatus::Cancelled {
            self.release_stock(&txn, &order)?;
        }
        if target == OrderStatus::Shipped {
            order.tracking_number = Some(generate_tracking_number(&order.id));
        }

        order.status = target;
        self.storage.store_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id, from = %from, to = %target, "order status transition");
        Ok(order)
    }

    /// Delete an order and, explicitly, all of its line items
    ///
    /// Only orders that never committed stock and kept it (`Pending`) or
    /// already released it (`Cancelled`) may be deleted; the movement log
    /// itself is never touched.
    pub fn delete_order(&self, order_id: &str) -> FulfillmentResult<()> {
        let txn = self.storage.begin_write()?;
        let order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;
        if !matches!(order.status, OrderStatus::Pending | OrderStatus::Cancelled) {
            return Err(FulfillmentError::InvalidInput(format!(
                "cannot delete order in status {}",
                order.status
            )));
        }
        self.storage.remove_items_for_order(&txn, order_id)?;
        self.storage.remove_order(&txn, order_id)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(order_id, "order deleted");
        Ok(())
    }

    // ========== Order Queries ==========

    /// Load an order with its line items
    pub fn find_order(&self, order_id: &str) -> FulfillmentResult<OrderDetail> {
        let order = self
            .storage
            .get_order(order_id)?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;
        let items = self.storage.items_for_order(order_id)?;
        Ok(OrderDetail { order, items })
    }

    pub fn find_orders_by_status(
        &self,
        status: OrderStatus,
    ) -> FulfillmentResult<Vec<CustomerOrder>> {
        let mut orders = self.storage.all_orders()?;
        orders.retain(|o| o.status == status);
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    pub fn find_orders_by_email(&self, email: &str) -> FulfillmentResult<Vec<CustomerOrder>> {
        if email.trim().is_empty() {
            return Err(FulfillmentError::InvalidInput(
                "email cannot be empty".to_string(),
            ));
        }
        let mut orders = self.storage.all_orders()?;
        orders.retain(|o| o.customer_email.eq_ignore_ascii_case(email));
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    pub fn find_orders_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FulfillmentResult<Vec<CustomerOrder>> {
        if start > end {
            return Err(FulfillmentError::InvalidInput(
                "start date cannot be after end date".to_string(),
            ));
        }
        let mut orders = self.storage.all_orders()?;
        orders.retain(|o| o.order_date >= start && o.order_date <= end);
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    pub fn find_recent_orders(&self, limit: usize) -> FulfillmentResult<Vec<CustomerOrder>> {
        if limit == 0 {
            return Err(FulfillmentError::InvalidInput(
                "limit must be greater than zero".to_string(),
            ));
        }
        let mut orders = self.storage.all_orders()?;
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        orders.truncate(limit);
        Ok(orders)
    }

    // ========== Supplier Orders ==========

    /// Create a supplier order with its lines fixed at creation
    pub fn create_supplier_order(
        &self,
        draft: SupplierOrderDraft,
    ) -> FulfillmentResult<SupplierOrder> {
        draft
            .validate()
            .map_err(|e| FulfillmentError::InvalidInput(e.to_string()))?;
        for line in &draft.lines {
            if line.quantity <= 0 {
                return Err(FulfillmentError::InvalidInput(
                    "line quantity must be greater than zero".to_string(),
                ));
            }
            if line.unit_cost < Decimal::ZERO {
                return Err(FulfillmentError::InvalidInput(
                    "line unit cost cannot be negative".to_string(),
                ));
            }
            if !self.catalog.product_exists(&line.product_id) {
                return Err(FulfillmentError::ProductNotFound(line.product_id.clone()));
            }
        }

        let mut order = SupplierOrder::new(draft.supplier_name);
        order.expected_delivery = draft.expected_delivery;

        let items: Vec<SupplierOrderItem> = draft
            .lines
            .iter()
            .map(|line| SupplierOrderItem {
                id: uuid::Uuid::new_v4().to_string(),
                supplier_order_id: order.id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_cost: line.unit_cost,
            })
            .collect();
        order.total_amount = items.iter().map(|i| i.line_total()).sum();

        let txn = self.storage.begin_write()?;
        self.storage.store_supplier_order(&txn, &order)?;
        for item in &items {
            self.storage.store_supplier_item(&txn, item)?;
        }
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(supplier_order_id = %order.id, lines = items.len(), "supplier order placed");
        Ok(order)
    }

    /// Mark a placed supplier order as received
    ///
    /// Applies one positive movement per line and completes the order.
    /// This path only adds stock, so it never fails on availability.
    pub fn receive_supplier_order(&self, order_id: &str) -> FulfillmentResult<SupplierOrder> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_supplier_order_txn(&txn, order_id)?
            .ok_or_else(|| FulfillmentError::SupplierOrderNotFound(order_id.to_string()))?;
        if order.status != SupplierOrderStatus::Placed {
            return Err(FulfillmentError::InvalidSupplierTransition {
                from: order.status,
                to: SupplierOrderStatus::Completed,
            });
        }

        let items = self.storage.supplier_items_for_order_txn(&txn, order_id)?;
        for item in &items {
            let request = NewMovement::new(
                &item.product_id,
                item.quantity,
                MovementType::SupplierOrder,
            )
            .with_reference(order_id)
            .with_notes(format!(
                "Supplier order #{} from {}",
                order_id, order.supplier_name
            ));
            self.ledger.apply_in(&txn, &request)?;
        }

        order.status = SupplierOrderStatus::Completed;
        self.storage.store_supplier_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(supplier_order_id = order_id, lines = items.len(), "supplier order received");
        Ok(order)
    }

    /// Cancel a supplier order that was never received
    pub fn cancel_supplier_order(&self, order_id: &str) -> FulfillmentResult<SupplierOrder> {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_supplier_order_txn(&txn, order_id)?
            .ok_or_else(|| FulfillmentError::SupplierOrderNotFound(order_id.to_string()))?;
        if order.status != SupplierOrderStatus::Placed {
            return Err(FulfillmentError::InvalidSupplierTransition {
                from: order.status,
                to: SupplierOrderStatus::Cancelled,
            });
        }
        order.status = SupplierOrderStatus::Cancelled;
        self.storage.store_supplier_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(order)
    }

    pub fn find_supplier_order(&self, order_id: &str) -> FulfillmentResult<SupplierOrderDetail> {
        let order = self
            .storage
            .get_supplier_order(order_id)?
            .ok_or_else(|| FulfillmentError::SupplierOrderNotFound(order_id.to_string()))?;
        let items = self.storage.supplier_items_for_order(order_id)?;
        Ok(SupplierOrderDetail { order, items })
    }

    pub fn find_supplier_orders_by_status(
        &self,
        status: SupplierOrderStatus,
    ) -> FulfillmentResult<Vec<SupplierOrder>> {
        let mut orders = self.storage.all_supplier_orders()?;
        orders.retain(|o| o.status == status);
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    // ========== Internals ==========

    /// Load an order whose items may still be edited
    fn load_editable_order(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> FulfillmentResult<CustomerOrder> {
        let order = self
            .storage
            .get_order_txn(txn, order_id)?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;
        if !order.status.items_editable() {
            return Err(FulfillmentError::ItemNotEditable(order.status));
        }
        Ok(order)
    }

    /// Recompute and store the order total from its current items
    fn store_recomputed_total(
        &self,
        txn: &WriteTransaction,
        mut order: CustomerOrder,
    ) -> FulfillmentResult<()> {
        let items = self.storage.items_for_order_txn(txn, &order.id)?;
        order.total_amount = recompute_total(&items);
        self.storage.store_order(txn, &order)?;
        Ok(())
    }

    /// Debit stock for every line item of an order, all-or-nothing
    ///
    /// The pre-flight walks every item before the first movement is
    /// appended; because check and apply share the transaction, no other
    /// writer can interleave between them.
    fn commit_stock(&self, txn: &WriteTransaction, order: &CustomerOrder) -> FulfillmentResult<()> {
        let items = self.storage.items_for_order_txn(txn, &order.id)?;
        if items.is_empty() {
            return Err(FulfillmentError::InvalidInput(
                "order has no items".to_string(),
            ));
        }

        // A success-ambiguous caller retry must not debit twice
        let already_committed = self
            .storage
            .movements_for_reference_txn(txn, &order.id)?
            .iter()
            .any(|m| m.movement_type == MovementType::CustomerOrder);
        if already_committed {
            return Err(FulfillmentError::ConcurrencyConflict(format!(
                "stock already committed for order {}",
                order.id
            )));
        }

        for item in &items {
            let available = self
                .storage
                .get_stock_txn(txn, &item.product_id)?
                .map(|s| s.quantity_available)
                .unwrap_or(0);
            if available < item.quantity {
                return Err(FulfillmentError::InsufficientStock {
                    product_id: item.product_id.clone(),
                    requested: item.quantity,
                    available,
                });
            }
        }

        for item in &items {
            let request = NewMovement::new(
                &item.product_id,
                -item.quantity,
                MovementType::CustomerOrder,
            )
            .with_reference(&order.id)
            .with_notes(format!("Customer order #{}", order.id));
            self.ledger.apply_in(txn, &request)?;
        }
        Ok(())
    }

    /// Reverse every prior commitment movement of a cancelled order
    fn release_stock(&self, txn: &WriteTransaction, order: &CustomerOrder) -> FulfillmentResult<()> {
        let commitments: Vec<_> = self
            .storage
            .movements_for_reference_txn(txn, &order.id)?
            .into_iter()
            .filter(|m| m.movement_type == MovementType::CustomerOrder)
            .collect();

        for movement in &commitments {
            let request = NewMovement::new(
                &movement.product_id,
                -movement.quantity,
                MovementType::Return,
            )
            .with_reference(&order.id)
            .with_notes(format!("Reversal for cancelled order #{}", order.id));
            self.ledger.apply_in(txn, &request)?;
        }

        if !commitments.is_empty() {
            tracing::info!(
                order_id = %order.id,
                reversals = commitments.len(),
                "released committed stock on cancellation"
            );
        }
        Ok(())
    }
}

/// Shipment tracking token recorded on transition to `Shipped`
fn generate_tracking_number(order_id: &str) -> String {
    let short: String = order_id.chars().take(8).collect();
    format!("TRK{}{}", Utc::now().timestamp_millis(), short)
}
