//! redb-based storage layer for the inventory ledger and order store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `stock` | `product_id` | `Stock` | Current-quantity projection |
//! | `movements` | `(product_id, sequence)` | `StockMovement` | Movement log (append-only) |
//! | `orders` | `order_id` | `CustomerOrder` | Customer order headers |
//! | `order_items` | `(order_id, item_id)` | `OrderItem` | Line items |
//! | `supplier_orders` | `order_id` | `SupplierOrder` | Replenishment orders |
//! | `supplier_order_items` | `(order_id, item_id)` | `SupplierOrderItem` | Replenishment lines |
//! | `counters` | counter name | `u64` | Global movement sequence |
//!
//! # Transactions
//!
//! redb admits a single live write transaction; every mutation of the
//! projection happens in the same transaction as its movement append, and
//! an order-status transition shares one transaction with all the stock
//! effects it triggers. A transaction dropped without `commit()` leaves no
//! trace, which carries the all-or-nothing guarantee through every failure
//! path, including timeouts.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::models::{
    CustomerOrder, OrderItem, Stock, StockMovement, SupplierOrder, SupplierOrderItem,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Stock projection: key = product_id, value = JSON-serialized Stock
const STOCK_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("stock");

/// Movement log: key = (product_id, sequence), value = JSON-serialized StockMovement
const MOVEMENTS_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("movements");

/// Customer order headers: key = order_id, value = JSON-serialized CustomerOrder
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Order line items: key = (order_id, item_id), value = JSON-serialized OrderItem
const ORDER_ITEMS_TABLE: TableDefinition<(&str, &str), &[u8]> =
    TableDefinition::new("order_items");

/// Supplier order headers: key = order_id, value = JSON-serialized SupplierOrder
const SUPPLIER_ORDERS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("supplier_orders");

/// Supplier order lines: key = (order_id, item_id), value = JSON-serialized SupplierOrderItem
const SUPPLIER_ORDER_ITEMS_TABLE: TableDefinition<(&str, &str), &[u8]> =
    TableDefinition::new("supplier_order_items");

/// Counters: key = counter name, value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const MOVEMENT_SEQUENCE_KEY: &str = "movement_seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Inventory storage backed by redb
///
/// Cheap to clone; all clones share one database handle.
#[derive(Clone)]
pub struct InventoryStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for InventoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryStorage").finish_non_exhaustive()
    }
}

impl InventoryStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate`: once `commit()` returns,
    /// the data survives power loss and the file is always in a consistent
    /// state (copy-on-write with atomic pointer swap).
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (tests, ephemeral deployments)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(STOCK_TABLE)?;
            let _ = write_txn.open_table(MOVEMENTS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_ITEMS_TABLE)?;
            let _ = write_txn.open_table(SUPPLIER_ORDERS_TABLE)?;
            let _ = write_txn.open_table(SUPPLIER_ORDER_ITEMS_TABLE)?;

            let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
            if counters.get(MOVEMENT_SEQUENCE_KEY)?.is_none() {
                counters.insert(MOVEMENT_SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    ///
    /// Blocks while another write transaction is live; this is the
    /// serialization point for conflicting ledger operations.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Movement Sequence ==========

    /// Increment and return the global movement sequence (within transaction)
    pub fn next_movement_sequence(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table
            .get(MOVEMENT_SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(MOVEMENT_SEQUENCE_KEY, next)?;
        Ok(next)
    }

    /// Current movement sequence (read-only)
    pub fn current_movement_sequence(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(table
            .get(MOVEMENT_SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    // ========== Stock Operations ==========

    /// Store (insert or replace) a stock projection row
    pub fn store_stock(&self, txn: &WriteTransaction, stock: &Stock) -> StorageResult<()> {
        let mut table = txn.open_table(STOCK_TABLE)?;
        let value = serde_json::to_vec(stock)?;
        table.insert(stock.product_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a stock row by product id
    pub fn get_stock(&self, product_id: &str) -> StorageResult<Option<Stock>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STOCK_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a stock row by product id (within transaction)
    pub fn get_stock_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
    ) -> StorageResult<Option<Stock>> {
        let table = txn.open_table(STOCK_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all stock rows
    pub fn all_stock(&self) -> StorageResult<Vec<Stock>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STOCK_TABLE)?;

        let mut rows = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            rows.push(serde_json::from_slice(value.value())?);
        }
        Ok(rows)
    }

    // ========== Movement Operations ==========

    /// Append a movement row
    pub fn store_movement(
        &self,
        txn: &WriteTransaction,
        movement: &StockMovement,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(MOVEMENTS_TABLE)?;
        let key = (movement.product_id.as_str(), movement.sequence);
        let value = serde_json::to_vec(movement)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// All movements for one product, ascending by sequence
    pub fn movements_for_product(&self, product_id: &str) -> StorageResult<Vec<StockMovement>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MOVEMENTS_TABLE)?;

        let mut movements = Vec::new();
        let range_start = (product_id, 0u64);
        let range_end = (product_id, u64::MAX);
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            movements.push(serde_json::from_slice::<StockMovement>(value.value())?);
        }
        movements.sort_by_key(|m| m.sequence);
        Ok(movements)
    }

    /// All movements for one product (within transaction)
    pub fn movements_for_product_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
    ) -> StorageResult<Vec<StockMovement>> {
        let table = txn.open_table(MOVEMENTS_TABLE)?;

        let mut movements = Vec::new();
        let range_start = (product_id, 0u64);
        let range_end = (product_id, u64::MAX);
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            movements.push(serde_json::from_slice::<StockMovement>(value.value())?);
        }
        movements.sort_by_key(|m| m.sequence);
        Ok(movements)
    }

    /// Every movement in the log, ascending by sequence
    pub fn all_movements(&self) -> StorageResult<Vec<StockMovement>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MOVEMENTS_TABLE)?;

        let mut movements = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            movements.push(serde_json::from_slice::<StockMovement>(value.value())?);
        }
        movements.sort_by_key(|m| m.sequence);
        Ok(movements)
    }

    /// Movements cross-referencing an order (within transaction)
    ///
    /// Used for commitment-retry detection and cancellation reversal, both
    /// of which must see movements inside the current transaction scope.
    pub fn movements_for_reference_txn(
        &self,
        txn: &WriteTransaction,
        reference_id: &str,
    ) -> StorageResult<Vec<StockMovement>> {
        let table = txn.open_table(MOVEMENTS_TABLE)?;

        let mut movements = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let movement: StockMovement = serde_json::from_slice(value.value())?;
            if movement.reference_id.as_deref() == Some(reference_id) {
                movements.push(movement);
            }
        }
        movements.sort_by_key(|m| m.sequence);
        Ok(movements)
    }

    // ========== Customer Order Operations ==========

    /// Store (insert or replace) an order header
    pub fn store_order(&self, txn: &WriteTransaction, order: &CustomerOrder) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an order header by id
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<CustomerOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order header by id (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<CustomerOrder>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All order headers
    pub fn all_orders(&self) -> StorageResult<Vec<CustomerOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            orders.push(serde_json::from_slice(value.value())?);
        }
        Ok(orders)
    }

    /// Remove an order header
    ///
    /// Line items are removed by `remove_items_for_order`; the two calls
    /// together form the explicit cascade delete.
    pub fn remove_order(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    // ========== Order Item Operations ==========

    /// Store (insert or replace) a line item
    pub fn store_item(&self, txn: &WriteTransaction, item: &OrderItem) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_ITEMS_TABLE)?;
        let key = (item.order_id.as_str(), item.id.as_str());
        let value = serde_json::to_vec(item)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// All line items of an order
    pub fn items_for_order(&self, order_id: &str) -> StorageResult<Vec<OrderItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_ITEMS_TABLE)?;

        let mut items = Vec::new();
        let range_start = (order_id, "");
        let range_end = (order_id, "\u{10ffff}");
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            items.push(serde_json::from_slice::<OrderItem>(value.value())?);
        }
        Ok(items)
    }

    /// All line items of an order (within transaction)
    pub fn items_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Vec<OrderItem>> {
        let table = txn.open_table(ORDER_ITEMS_TABLE)?;

        let mut items = Vec::new();
        let range_start = (order_id, "");
        let range_end = (order_id, "\u{10ffff}");
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            items.push(serde_json::from_slice::<OrderItem>(value.value())?);
        }
        Ok(items)
    }

    /// Remove one line item
    pub fn remove_item(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        item_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_ITEMS_TABLE)?;
        table.remove((order_id, item_id))?;
        Ok(())
    }

    /// Remove every line item of an order (cascade step)
    pub fn remove_items_for_order(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<()> {
        let items = self.items_for_order_txn(txn, order_id)?;
        let mut table = txn.open_table(ORDER_ITEMS_TABLE)?;
        for item in items {
            table.remove((order_id, item.id.as_str()))?;
        }
        Ok(())
    }

    // ========== Supplier Order Operations ==========

    /// Store (insert or replace) a supplier order header
    pub fn store_supplier_order(
        &self,
        txn: &WriteTransaction,
        order: &SupplierOrder,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SUPPLIER_ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a supplier order header by id
    pub fn get_supplier_order(&self, order_id: &str) -> StorageResult<Option<SupplierOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SUPPLIER_ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a supplier order header by id (within transaction)
    pub fn get_supplier_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<SupplierOrder>> {
        let table = txn.open_table(SUPPLIER_ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All supplier order headers
    pub fn all_supplier_orders(&self) -> StorageResult<Vec<SupplierOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SUPPLIER_ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            orders.push(serde_json::from_slice(value.value())?);
        }
        Ok(orders)
    }

    /// Store (insert or replace) a supplier order line
    pub fn store_supplier_item(
        &self,
        txn: &WriteTransaction,
        item: &SupplierOrderItem,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(SUPPLIER_ORDER_ITEMS_TABLE)?;
        let key = (item.supplier_order_id.as_str(), item.id.as_str());
        let value = serde_json::to_vec(item)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    /// All lines of a supplier order
    pub fn supplier_items_for_order(
        &self,
        order_id: &str,
    ) -> StorageResult<Vec<SupplierOrderItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SUPPLIER_ORDER_ITEMS_TABLE)?;

        let mut items = Vec::new();
        let range_start = (order_id, "");
        let range_end = (order_id, "\u{10ffff}");
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            items.push(serde_json::from_slice::<SupplierOrderItem>(value.value())?);
        }
        Ok(items)
    }

    /// All lines of a supplier order (within transaction)
    pub fn supplier_items_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Vec<SupplierOrderItem>> {
        let table = txn.open_table(SUPPLIER_ORDER_ITEMS_TABLE)?;

        let mut items = Vec::new();
        let range_start = (order_id, "");
        let range_end = (order_id, "\u{10ffff}");
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            items.push(serde_json::from_slice::<SupplierOrderItem>(value.value())?);
        }
        Ok(items)
    }
}
