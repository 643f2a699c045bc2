//! Reorder advisor - read-only replenishment projection
//!
//! Joins the stock projection with catalog reorder levels and ranks the
//! results. Polled by dashboards and alerting; it has no write path into
//! the ledger and reflects whatever the ledger last committed.

use crate::catalog::ProductCatalog;
use crate::ledger::{LedgerResult, StockLedger};
use serde::{Deserialize, Serialize};
use shared::models::{Product, Stock};
use std::sync::Arc;

/// A product flagged for replenishment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReorderCandidate {
    pub product: Product,
    pub stock: Stock,
    /// How far below the reorder level the product sits (>= 0)
    pub shortfall: i64,
}

/// Read-only view over ledger + catalog
#[derive(Clone)]
pub struct ReorderAdvisor {
    ledger: StockLedger,
    catalog: Arc<dyn ProductCatalog>,
}

impl ReorderAdvisor {
    pub fn new(ledger: StockLedger, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { ledger, catalog }
    }

    /// Products at or below their reorder level, most depleted first
    ///
    /// Products with a zero reorder level never appear. The ordering is a
    /// presentation convenience for dashboards, not a contract.
    pub fn list_reorder_candidates(&self) -> LedgerResult<Vec<ReorderCandidate>> {
        let mut candidates = Vec::new();
        for stock in self.ledger.reorder_candidates()? {
            if let Some(product) = self.catalog.get_product(&stock.product_id) {
                let shortfall = product.reorder_level - stock.quantity_available;
                candidates.push(ReorderCandidate {
                    product,
                    stock,
                    shortfall,
                });
            }
        }
        candidates.sort_by(|a, b| {
            b.shortfall
                .cmp(&a.shortfall)
                .then_with(|| a.product.name.cmp(&b.product.name))
        });
        Ok(candidates)
    }
}
