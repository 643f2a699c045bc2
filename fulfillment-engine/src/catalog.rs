//! Product catalog collaborator
//!
//! The catalog is owned outside the fulfillment core: the engine reads
//! product identity, price, and reorder level through this trait and never
//! writes back. `InMemoryProductCatalog` serves tests and embedded
//! single-process deployments; a real deployment can back the trait with
//! whatever catalog store it already has.

use parking_lot::RwLock;
use shared::models::Product;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only product lookup consumed by the ledger and fulfillment engine
pub trait ProductCatalog: Send + Sync {
    /// Look up a product by id
    fn get_product(&self, product_id: &str) -> Option<Product>;

    /// Look up a product by SKU
    fn find_by_sku(&self, sku: &str) -> Option<Product>;

    /// Every product in the catalog (used by the reorder projection)
    fn all_products(&self) -> Vec<Product>;

    fn product_exists(&self, product_id: &str) -> bool {
        self.get_product(product_id).is_some()
    }
}

/// In-memory catalog behind a read-write lock
///
/// SKU uniqueness is the catalog owner's invariant; `insert` replaces any
/// previous entry with the same product id.
#[derive(Clone, Default)]
pub struct InMemoryProductCatalog {
    products: Arc<RwLock<HashMap<String, Product>>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product
    pub fn insert(&self, product: Product) {
        self.products.write().insert(product.id.clone(), product);
    }

    /// Remove a product, returning it if present
    pub fn remove(&self, product_id: &str) -> Option<Product> {
        self.products.write().remove(product_id)
    }

    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }
}

impl std::fmt::Debug for InMemoryProductCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryProductCatalog")
            .field("products", &self.products.read().len())
            .finish()
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn get_product(&self, product_id: &str) -> Option<Product> {
        self.products.read().get(product_id).cloned()
    }

    fn find_by_sku(&self, sku: &str) -> Option<Product> {
        self.products.read().values().find(|p| p.sku == sku).cloned()
    }

    fn all_products(&self) -> Vec<Product> {
        self.products.read().values().cloned().collect()
    }
}
