//! Order status state machine
//!
//! The legal transition table, kept as one pure function so the engine and
//! the tests share a single source of truth. Anything not listed here is
//! illegal, including self-transitions.

use shared::models::OrderStatus;

/// Whether `from → to` is a legal order status transition
pub fn is_legal(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, Processing)
            | (Pending, Paid)
            | (Pending, Cancelled)
            | (Paid, Processing)
            | (Paid, Shipped)
            | (Paid, Cancelled)
            | (Processing, Shipped)
            | (Processing, Cancelled)
            | (Shipped, Delivered)
    )
}

/// Whether the transition commits stock (one debit movement per line item)
pub fn commits_stock(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    // Entering Processing always commits. A paid order shipped directly
    // skips Processing, so its commitment happens on the shipment itself.
    matches!((from, to), (Pending, Processing) | (Paid, Processing) | (Paid, Shipped))
}
