//! End-to-end fulfillment scenarios

use fulfillment_engine::{
    FulfillmentEngine, FulfillmentError, InMemoryProductCatalog, InventoryStorage, MovementFilter,
    MovementType, NewMovement, OrderDraft, OrderStatus, Product, ReorderAdvisor,
};
use rust_decimal::Decimal;
use std::sync::Arc;

struct World {
    engine: FulfillmentEngine,
    advisor: ReorderAdvisor,
    catalog: InMemoryProductCatalog,
    storage: InventoryStorage,
}

fn world() -> World {
    let catalog = InMemoryProductCatalog::new();
    let storage = InventoryStorage::open_in_memory().unwrap();
    let engine = FulfillmentEngine::new(storage.clone(), Arc::new(catalog.clone()));
    let advisor = ReorderAdvisor::new(engine.ledger().clone(), Arc::new(catalog.clone()));
    World {
        engine,
        advisor,
        catalog,
        storage,
    }
}

fn stocked_product(world: &World, reorder_level: i64, on_hand: i64) -> String {
    let product = Product::new("Widget", "WID-001", Decimal::new(1999, 2), reorder_level);
    let id = product.id.clone();
    world.catalog.insert(product);
    world
        .engine
        .ledger()
        .apply_movement(NewMovement::new(&id, on_hand, MovementType::Purchase))
        .unwrap();
    id
}

fn order_for(world: &World, name: &str, email: &str) -> String {
    world
        .engine
        .create_order(OrderDraft {
            customer_name: name.to_string(),
            customer_email: email.to_string(),
        })
        .unwrap()
        .id
}

/// Product P has 10 on hand with reorder level 5. Order O for 3 units is
/// committed and shipped; a second order for 20 units must fail without
/// disturbing the remaining 7.
#[test]
fn commitment_shipment_and_oversized_order() {
    let world = world();
    let product = stocked_product(&world, 5, 10);

    let order = order_for(&world, "Alice", "alice@example.com");
    world.engine.add_item(&order, &product, 3, None).unwrap();

    world
        .engine
        .transition_status(&order, OrderStatus::Processing)
        .unwrap();
    assert_eq!(
        world.engine.ledger().get_stock(&product).unwrap().quantity_available,
        7
    );

    let commitments = world
        .engine
        .ledger()
        .get_movements(&MovementFilter::for_reference(&order))
        .unwrap();
    assert_eq!(commitments.len(), 1);
    assert_eq!(commitments[0].movement_type, MovementType::CustomerOrder);
    assert_eq!(commitments[0].quantity, -3);

    // Shipping adds a tracking token but no movement
    let shipped = world
        .engine
        .transition_status(&order, OrderStatus::Shipped)
        .unwrap();
    assert!(shipped.tracking_number.is_some());
    assert_eq!(
        world
            .engine
            .ledger()
            .get_movements(&MovementFilter::for_product(&product))
            .unwrap()
            .len(),
        2 // initial purchase + one commitment
    );

    // A 20-unit order against the remaining 7 fails and changes nothing
    let oversized = order_for(&world, "Bob", "bob@example.com");
    world.engine.add_item(&oversized, &product, 20, None).unwrap();
    match world
        .engine
        .transition_status(&oversized, OrderStatus::Processing)
    {
        Err(FulfillmentError::InsufficientStock {
            requested,
            available,
            ..
        }) => {
            assert_eq!(requested, 20);
            assert_eq!(available, 7);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(
        world.engine.ledger().get_stock(&product).unwrap().quantity_available,
        7
    );

    // Cancelling the oversized order from PENDING has no stock step
    world
        .engine
        .transition_status(&oversized, OrderStatus::Cancelled)
        .unwrap();
    assert!(world
        .engine
        .ledger()
        .get_movements(&MovementFilter::for_reference(&oversized))
        .unwrap()
        .is_empty());
}

#[test]
fn cancellation_restores_pre_commitment_quantity() {
    let world = world();
    let product = stocked_product(&world, 0, 10);
    let order = order_for(&world, "Alice", "alice@example.com");
    world.engine.add_item(&order, &product, 4, None).unwrap();

    world
        .engine
        .transition_status(&order, OrderStatus::Processing)
        .unwrap();
    world
        .engine
        .transition_status(&order, OrderStatus::Cancelled)
        .unwrap();

    assert_eq!(
        world.engine.ledger().get_stock(&product).unwrap().quantity_available,
        10
    );

    // The log keeps both sides of the story
    let movements = world
        .engine
        .ledger()
        .get_movements(&MovementFilter::for_reference(&order))
        .unwrap();
    let debits: Vec<_> = movements
        .iter()
        .filter(|m| m.movement_type == MovementType::CustomerOrder)
        .collect();
    let reversals: Vec<_> = movements
        .iter()
        .filter(|m| m.movement_type == MovementType::Return)
        .collect();
    assert_eq!(debits.len(), 1);
    assert_eq!(reversals.len(), 1);
    assert_eq!(debits[0].quantity + reversals[0].quantity, 0);

    assert!(world
        .engine
        .ledger()
        .verify_projection(&product)
        .unwrap()
        .is_consistent());
}

#[test]
fn every_illegal_transition_is_rejected_and_harmless() {
    let statuses = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];
    let legal = [
        (OrderStatus::Pending, OrderStatus::Processing),
        (OrderStatus::Pending, OrderStatus::Paid),
        (OrderStatus::Pending, OrderStatus::Cancelled),
        (OrderStatus::Paid, OrderStatus::Processing),
        (OrderStatus::Paid, OrderStatus::Shipped),
        (OrderStatus::Paid, OrderStatus::Cancelled),
        (OrderStatus::Processing, OrderStatus::Shipped),
        (OrderStatus::Processing, OrderStatus::Cancelled),
        (OrderStatus::Shipped, OrderStatus::Delivered),
    ];

    // Walk a fresh order into each starting status, then try every target
    for from in statuses {
        for to in statuses {
            if legal.contains(&(from, to)) {
                continue;
            }

            let world = world();
            let product = stocked_product(&world, 0, 100);
            let order = order_for(&world, "Alice", "alice@example.com");
            world.engine.add_item(&order, &product, 1, None).unwrap();
            for step in path_to(from) {
                world.engine.transition_status(&order, step).unwrap();
            }

            let result = world.engine.transition_status(&order, to);
            match result {
                Err(FulfillmentError::InvalidTransition { from: f, to: t }) => {
                    assert_eq!(f, from);
                    assert_eq!(t, to);
                }
                other => panic!("expected InvalidTransition for {from} -> {to}, got {other:?}"),
            }
            assert_eq!(
                world.engine.find_order(&order).unwrap().order.status,
                from,
                "order must be untouched after rejected {from} -> {to}"
            );
        }
    }
}

/// Shortest legal path from PENDING into the given status
fn path_to(status: OrderStatus) -> Vec<OrderStatus> {
    match status {
        OrderStatus::Pending => vec![],
        OrderStatus::Paid => vec![OrderStatus::Paid],
        OrderStatus::Processing => vec![OrderStatus::Processing],
        OrderStatus::Shipped => vec![OrderStatus::Processing, OrderStatus::Shipped],
        OrderStatus::Delivered => vec![
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ],
        OrderStatus::Cancelled => vec![OrderStatus::Cancelled],
    }
}

/// A restored or replayed order header must not be committed a second
/// time: the ledger already carries the order's debit movements, and the
/// `(reference_id, movement_type)` dedup key catches the replay before any
/// stock effect.
#[test]
fn commitment_retry_is_detected() {
    let world = world();
    let product = stocked_product(&world, 0, 10);
    let order = order_for(&world, "Alice", "alice@example.com");
    world.engine.add_item(&order, &product, 2, None).unwrap();

    world
        .engine
        .transition_status(&order, OrderStatus::Paid)
        .unwrap();
    world
        .engine
        .transition_status(&order, OrderStatus::Processing)
        .unwrap();
    assert_eq!(
        world.engine.ledger().get_stock(&product).unwrap().quantity_available,
        8
    );

    // Simulate an upstream replay: the order header is rewound to PAID
    // (as a backup restore or duplicated command stream would do) while
    // the ledger still holds the original commitment.
    let mut header = world.engine.find_order(&order).unwrap().order;
    header.status = OrderStatus::Paid;
    let txn = world.storage.begin_write().unwrap();
    world.storage.store_order(&txn, &header).unwrap();
    txn.commit().unwrap();

    let result = world.engine.transition_status(&order, OrderStatus::Processing);
    assert!(matches!(
        result,
        Err(FulfillmentError::ConcurrencyConflict(_))
    ));

    // No double debit
    assert_eq!(
        world.engine.ledger().get_stock(&product).unwrap().quantity_available,
        8
    );
    assert!(world
        .engine
        .ledger()
        .verify_projection(&product)
        .unwrap()
        .is_consistent());
}

#[test]
fn reorder_advisor_tracks_fulfillment() {
    let world = world();
    let product = stocked_product(&world, 5, 8);

    assert!(world.advisor.list_reorder_candidates().unwrap().is_empty());

    let order = order_for(&world, "Alice", "alice@example.com");
    world.engine.add_item(&order, &product, 4, None).unwrap();
    world
        .engine
        .transition_status(&order, OrderStatus::Processing)
        .unwrap();

    // 4 left on hand, level 5 -> flagged with shortfall 1
    let candidates = world.advisor.list_reorder_candidates().unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].shortfall, 1);
    assert_eq!(candidates[0].stock.quantity_available, 4);
}

#[test]
fn movement_log_matches_commit_order() {
    let world = world();
    let product = stocked_product(&world, 0, 50);

    let first = order_for(&world, "Alice", "alice@example.com");
    world.engine.add_item(&first, &product, 5, None).unwrap();
    let second = order_for(&world, "Bob", "bob@example.com");
    world.engine.add_item(&second, &product, 7, None).unwrap();

    world
        .engine
        .transition_status(&first, OrderStatus::Processing)
        .unwrap();
    world
        .engine
        .transition_status(&second, OrderStatus::Processing)
        .unwrap();

    let movements = world
        .engine
        .ledger()
        .get_movements(&MovementFilter::for_product(&product))
        .unwrap();
    // Newest first: second order's debit, first order's debit, seed purchase
    assert_eq!(movements.len(), 3);
    assert_eq!(movements[0].reference_id.as_deref(), Some(second.as_str()));
    assert_eq!(movements[1].reference_id.as_deref(), Some(first.as_str()));
    assert!(movements[0].sequence > movements[1].sequence);
    assert!(movements[0].movement_date >= movements[1].movement_date);
}
