//! Ledger invariant tests
//!
//! The projection must equal the sum of the movement history for every
//! product, at all times, on every path - including randomized workloads
//! and reopening the database from disk.

use fulfillment_engine::{
    InMemoryProductCatalog, InventoryStorage, LedgerError, MovementFilter, MovementType,
    NewMovement, Product, StockLedger,
};
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;

fn seed_catalog(count: usize) -> (InMemoryProductCatalog, Vec<String>) {
    let catalog = InMemoryProductCatalog::new();
    let ids = (0..count)
        .map(|i| {
            let product = Product::new(
                format!("Product {i}"),
                format!("SKU-{i:03}"),
                Decimal::new(500 + i as i64 * 25, 2),
                5,
            );
            let id = product.id.clone();
            catalog.insert(product);
            id
        })
        .collect();
    (catalog, ids)
}

#[test]
fn projection_tracks_ledger_under_random_workload() {
    let (catalog, product_ids) = seed_catalog(4);
    let storage = InventoryStorage::open_in_memory().unwrap();
    let ledger = StockLedger::new(storage, Arc::new(catalog));

    let mut rng = rand::thread_rng();
    let mut expected: Vec<i64> = vec![0; product_ids.len()];

    for _ in 0..300 {
        let idx = rng.gen_range(0..product_ids.len());
        let product_id = &product_ids[idx];
        let delta: i64 = rng.gen_range(-15..=20);
        if delta == 0 {
            continue;
        }
        let movement_type = if delta > 0 {
            MovementType::Purchase
        } else {
            MovementType::Sale
        };

        let result = ledger.apply_movement(NewMovement::new(product_id, delta, movement_type));
        match result {
            Ok(stock) => {
                expected[idx] += delta;
                assert_eq!(stock.quantity_available, expected[idx]);
            }
            Err(LedgerError::InsufficientStock {
                requested,
                available,
                ..
            }) => {
                // Rejected applications must not move anything
                assert!(delta < 0);
                assert_eq!(requested, -delta);
                assert_eq!(available, expected[idx]);
            }
            Err(other) => panic!("unexpected error: {other}"),
        }

        // The invariant holds after every single application
        if expected[idx] != 0 || ledger.get_stock(product_id).is_ok() {
            let audit = ledger.verify_projection(product_id).unwrap();
            assert!(
                audit.is_consistent(),
                "projection {} != ledger sum {} for {product_id}",
                audit.projected,
                audit.ledger_sum
            );
            assert_eq!(audit.projected, expected[idx]);
        }
    }

    // Quantities can never have gone negative
    for (idx, product_id) in product_ids.iter().enumerate() {
        if let Ok(stock) = ledger.get_stock(product_id) {
            assert!(stock.quantity_available >= 0);
            assert_eq!(stock.quantity_available, expected[idx]);
        }
    }
}

#[test]
fn ledger_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("inventory.redb");

    let (catalog, product_ids) = seed_catalog(1);
    let product_id = product_ids[0].clone();
    let catalog = Arc::new(catalog);

    {
        let storage = InventoryStorage::open(&db_path).unwrap();
        let ledger = StockLedger::new(storage, catalog.clone());
        ledger
            .apply_movement(NewMovement::new(&product_id, 12, MovementType::Purchase))
            .unwrap();
        ledger
            .apply_movement(
                NewMovement::new(&product_id, -5, MovementType::Sale).with_reference("order-1"),
            )
            .unwrap();
    }

    let storage = InventoryStorage::open(&db_path).unwrap();
    let ledger = StockLedger::new(storage, catalog);

    let stock = ledger.get_stock(&product_id).unwrap();
    assert_eq!(stock.quantity_available, 7);

    let audit = ledger.verify_projection(&product_id).unwrap();
    assert!(audit.is_consistent());

    let movements = ledger
        .get_movements(&MovementFilter::for_product(&product_id))
        .unwrap();
    assert_eq!(movements.len(), 2);
    // Newest first; sequences continue where the previous run left off
    assert_eq!(movements[0].quantity, -5);
    assert_eq!(movements[0].reference_id.as_deref(), Some("order-1"));
}

#[test]
fn corrections_append_instead_of_editing() {
    let (catalog, product_ids) = seed_catalog(1);
    let product_id = product_ids[0].clone();
    let storage = InventoryStorage::open_in_memory().unwrap();
    let ledger = StockLedger::new(storage, Arc::new(catalog));

    ledger
        .apply_movement(NewMovement::new(&product_id, 10, MovementType::Purchase))
        .unwrap();
    // A miscount fixed with an offsetting adjustment, not by rewriting
    ledger
        .create_adjustment(&product_id, -2, "cycle count found 8 on hand")
        .unwrap();

    let movements = ledger
        .get_movements(&MovementFilter::for_product(&product_id))
        .unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(ledger.get_stock(&product_id).unwrap().quantity_available, 8);
    assert!(ledger.verify_projection(&product_id).unwrap().is_consistent());
}
