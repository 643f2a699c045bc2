//! Stock ledger - quantity projection plus append-only movement history
//!
//! # Invariant
//!
//! For every product, `Stock.quantity_available` equals the sum of all its
//! movement quantities. Both sides of that equation are only ever written
//! together, inside one write transaction; `verify_projection` recomputes
//! the sum for audits.
//!
//! # Movement Flow
//!
//! ```text
//! apply_movement(request)
//!     ├─ 1. Validate delta and product
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Load (or lazily create) the stock row
//!     ├─ 4. Reject if quantity would go negative
//!     ├─ 5. Append movement (global sequence, commit-time timestamp)
//!     ├─ 6. Store updated projection
//!     └─ 7. Commit
//! ```
//!
//! Failures before step 7 leave no partial state. Applications are not
//! idempotent: retrying a success-ambiguous call appends a second
//! movement, so callers dedup on `(reference_id, movement_type)`.

use crate::catalog::ProductCatalog;
use crate::storage::{InventoryStorage, StorageError};
use chrono::Utc;
use redb::WriteTransaction;
use serde::{Deserialize, Serialize};
use shared::models::{MovementFilter, MovementType, Stock, StockMovement};
use std::sync::Arc;
use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("No stock record for product: {0}")]
    StockNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// A movement to be applied to the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMovement {
    pub product_id: String,
    /// Signed quantity delta; zero is rejected
    pub delta: i64,
    pub movement_type: MovementType,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
}

impl NewMovement {
    pub fn new(product_id: impl Into<String>, delta: i64, movement_type: MovementType) -> Self {
        Self {
            product_id: product_id.into(),
            delta,
            movement_type,
            reference_id: None,
            notes: None,
        }
    }

    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Result of recomputing a product's projection from its movement history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectionAudit {
    pub product_id: String,
    /// Quantity stored in the projection row
    pub projected: i64,
    /// Sum of all movement quantities
    pub ledger_sum: i64,
}

impl ProjectionAudit {
    pub fn is_consistent(&self) -> bool {
        self.projected == self.ledger_sum
    }
}

/// The stock ledger
///
/// Cheap to clone; clones share the storage handle and catalog.
#[derive(Clone)]
pub struct StockLedger {
    storage: InventoryStorage,
    catalog: Arc<dyn ProductCatalog>,
}

impl StockLedger {
    pub fn new(storage: InventoryStorage, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { storage, catalog }
    }

    // ========== Write Path ==========

    /// Apply a single movement in its own transaction
    pub fn apply_movement(&self, request: NewMovement) -> LedgerResult<Stock> {
        let txn = self.storage.begin_write()?;
        let (stock, movement) = self.apply_in(&txn, &request)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::debug!(
            product_id = %movement.product_id,
            quantity = movement.quantity,
            movement_type = %movement.movement_type,
            sequence = movement.sequence,
            "stock movement applied"
        );
        Ok(stock)
    }

    /// Apply a movement inside a caller-owned transaction
    ///
    /// Lets the fulfillment engine bundle several movements and an order
    /// status write into one commit. Nothing here is visible until the
    /// caller commits.
    pub(crate) fn apply_in(
        &self,
        txn: &WriteTransaction,
        request: &NewMovement,
    ) -> LedgerResult<(Stock, StockMovement)> {
        if request.delta == 0 {
            return Err(LedgerError::InvalidInput(
                "movement quantity cannot be zero".to_string(),
            ));
        }
        if !self.catalog.product_exists(&request.product_id) {
            return Err(LedgerError::ProductNotFound(request.product_id.clone()));
        }

        // Lazily create the projection row on first movement
        let mut stock = self
            .storage
            .get_stock_txn(txn, &request.product_id)?
            .unwrap_or_else(|| Stock::new(request.product_id.clone()));

        let next = stock.quantity_available + request.delta;
        if next < 0 {
            return Err(LedgerError::InsufficientStock {
                product_id: request.product_id.clone(),
                requested: -request.delta,
                available: stock.quantity_available,
            });
        }

        let sequence = self.storage.next_movement_sequence(txn)?;
        let movement = StockMovement {
            sequence,
            product_id: request.product_id.clone(),
            movement_type: request.movement_type,
            quantity: request.delta,
            reference_id: request.reference_id.clone(),
            movement_date: Utc::now(),
            notes: request.notes.clone(),
        };
        self.storage.store_movement(txn, &movement)?;

        stock.quantity_available = next;
        stock.last_updated = movement.movement_date;
        self.storage.store_stock(txn, &stock)?;

        Ok((stock, movement))
    }

    /// Record a manual correction movement
    ///
    /// Adjustments always carry an explanation; corrections without context
    /// are useless in an audit.
    pub fn create_adjustment(
        &self,
        product_id: &str,
        delta: i64,
        notes: &str,
    ) -> LedgerResult<StockMovement> {
        if notes.trim().is_empty() {
            return Err(LedgerError::InvalidInput(
                "notes cannot be empty for a stock adjustment".to_string(),
            ));
        }

        let request = NewMovement::new(product_id, delta, MovementType::Adjustment)
            .with_notes(notes.to_string());
        let txn = self.storage.begin_write()?;
        let (_, movement) = self.apply_in(&txn, &request)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            product_id,
            delta,
            sequence = movement.sequence,
            "stock adjustment recorded"
        );
        Ok(movement)
    }

    // ========== Read Path ==========

    /// Current stock for a product
    pub fn get_stock(&self, product_id: &str) -> LedgerResult<Stock> {
        if !self.catalog.product_exists(product_id) {
            return Err(LedgerError::ProductNotFound(product_id.to_string()));
        }
        self.storage
            .get_stock(product_id)?
            .ok_or_else(|| LedgerError::StockNotFound(product_id.to_string()))
    }

    /// Current stock looked up by SKU
    pub fn get_stock_by_sku(&self, sku: &str) -> LedgerResult<Stock> {
        let product = self
            .catalog
            .find_by_sku(sku)
            .ok_or_else(|| LedgerError::ProductNotFound(format!("SKU {sku}")))?;
        self.storage
            .get_stock(&product.id)?
            .ok_or_else(|| LedgerError::StockNotFound(product.id))
    }

    /// Movement history, newest first
    pub fn get_movements(&self, filter: &MovementFilter) -> LedgerResult<Vec<StockMovement>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from > to
        {
            return Err(LedgerError::InvalidInput(
                "start date cannot be after end date".to_string(),
            ));
        }

        let mut movements = match &filter.product_id {
            Some(product_id) => self.storage.movements_for_product(product_id)?,
            None => self.storage.all_movements()?,
        };
        movements.retain(|m| filter.matches(m));
        movements.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(movements)
    }

    /// Stock rows at or below their product's reorder level
    ///
    /// A reorder level of zero opts the product out.
    pub fn reorder_candidates(&self) -> LedgerResult<Vec<Stock>> {
        let mut candidates = Vec::new();
        for stock in self.storage.all_stock()? {
            if let Some(product) = self.catalog.get_product(&stock.product_id)
                && stock.needs_reorder(&product)
            {
                candidates.push(stock);
            }
        }
        Ok(candidates)
    }

    /// Stock rows with nothing left on hand
    pub fn out_of_stock(&self) -> LedgerResult<Vec<Stock>> {
        let mut rows = self.storage.all_stock()?;
        rows.retain(|s| s.quantity_available == 0);
        Ok(rows)
    }

    /// Recompute a product's projection from its movement history
    pub fn verify_projection(&self, product_id: &str) -> LedgerResult<ProjectionAudit> {
        let stock = self.get_stock(product_id)?;
        let ledger_sum = self
            .storage
            .movements_for_product(product_id)?
            .iter()
            .map(|m| m.quantity)
            .sum();
        Ok(ProjectionAudit {
            product_id: product_id.to_string(),
            projected: stock.quantity_available,
            ledger_sum,
        })
    }

}
