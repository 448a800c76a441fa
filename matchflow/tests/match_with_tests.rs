// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::Arc;

use matchflow::{match_with, MatchSubscription, SingleSubject};
use matchflow_core::{demand, Subscription};
use matchflow_test_utils::fixtures::{delivery, order, shipment, Delivery, Order, Shipment};
use matchflow_test_utils::RecordingSubscriber;

fn setup(
    batch_size: u64,
) -> (
    SingleSubject<Order>,
    SingleSubject<Shipment>,
    Arc<RecordingSubscriber<Delivery>>,
    MatchSubscription,
) {
    let orders = SingleSubject::new();
    let shipments = SingleSubject::new();
    let recorder = Arc::new(RecordingSubscriber::new());

    let subscription = match_with(
        orders.clone(),
        shipments.clone(),
        |o: &Order| Ok(o.id),
        |s: &Shipment| Ok(s.order_id),
        |o, s| Ok(Delivery::from_parts(o, s)),
        batch_size,
    )
    .subscribe(recorder.clone());

    (orders, shipments, recorder, subscription)
}

#[tokio::test]
async fn test_match_single_pair_order_first() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(16);
    subscription.request(demand::UNBOUNDED);

    // Act
    orders.on_next(order(1, "alice"));
    shipments.on_next(shipment(1, "truck"));

    // Assert
    assert_eq!(recorder.values(), vec![delivery(1, "alice", "truck")]);
    assert!(!recorder.is_completed());
}

#[tokio::test]
async fn test_match_single_pair_shipment_first() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(16);
    subscription.request(demand::UNBOUNDED);

    // Act
    shipments.on_next(shipment(1, "truck"));
    orders.on_next(order(1, "alice"));

    // Assert
    assert_eq!(recorder.values(), vec![delivery(1, "alice", "truck")]);
}

#[tokio::test]
async fn test_duplicate_keys_match_in_fifo_order() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(16);
    subscription.request(demand::UNBOUNDED);

    // Act
    orders.on_next(order(1, "alice"));
    orders.on_next(order(1, "bob"));
    shipments.on_next(shipment(1, "truck"));

    // Assert: the oldest cached order matches first
    assert_eq!(recorder.values(), vec![delivery(1, "alice", "truck")]);

    // Act
    shipments.on_next(shipment(1, "ship"));

    // Assert: each item is matched at most once
    assert_eq!(
        recorder.values(),
        vec![delivery(1, "alice", "truck"), delivery(1, "bob", "ship")]
    );
}

#[tokio::test]
async fn test_leftover_duplicate_is_matched_exactly_once() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(16);
    subscription.request(demand::UNBOUNDED);

    // Act: two orders for the same key, a single shipment
    orders.on_next(order(1, "alice"));
    orders.on_next(order(1, "bob"));
    shipments.on_next(shipment(1, "truck"));
    orders.on_completed();
    shipments.on_completed();

    // Assert: one combination, then completion once both sides ended
    assert_eq!(recorder.values(), vec![delivery(1, "alice", "truck")]);
    assert!(recorder.is_completed());
    assert_eq!(recorder.terminal_count(), 1);
}

#[tokio::test]
async fn test_side_completing_without_pending_items_ends_the_join() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(16);
    subscription.request(demand::UNBOUNDED);

    // Act: the order side ends before producing anything
    orders.on_completed();

    // Assert: no pairing is possible anymore
    assert!(recorder.is_completed());
    assert_eq!(recorder.value_count(), 0);
    assert!(shipments.is_cancelled());

    // Act: late shipments are dropped, no second terminal
    shipments.on_next(shipment(1, "truck"));
    assert_eq!(recorder.value_count(), 0);
    assert_eq!(recorder.terminal_count(), 1);
}

#[tokio::test]
async fn test_matched_pair_then_completion_of_drained_side() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(16);
    subscription.request(demand::UNBOUNDED);

    orders.on_next(order(1, "alice"));
    shipments.on_next(shipment(1, "truck"));

    // Act: the order side has nothing of its own pending
    orders.on_completed();

    // Assert
    assert!(recorder.is_completed());
    assert_eq!(recorder.values(), vec![delivery(1, "alice", "truck")]);
    assert!(shipments.is_cancelled());
}

#[tokio::test]
async fn test_distinct_keys_complete_with_no_output() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(16);
    subscription.request(demand::UNBOUNDED);

    orders.on_next(order(1, "alice"));
    shipments.on_next(shipment(2, "truck"));

    // Act: the first completion leaves the order side's items pending
    orders.on_completed();
    assert!(!recorder.is_completed());

    shipments.on_completed();

    // Assert: both ended, nothing ever matched
    assert!(recorder.is_completed());
    assert_eq!(recorder.value_count(), 0);
}

#[tokio::test]
async fn test_unmatched_items_of_surviving_side_are_discarded() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(16);
    subscription.request(demand::UNBOUNDED);

    orders.on_next(order(1, "alice"));
    orders.on_next(order(2, "bob"));

    // Act: the shipment side ends with no shipments of its own pending
    shipments.on_completed();

    // Assert: the cached orders are dropped without a report
    assert!(recorder.is_completed());
    assert_eq!(recorder.value_count(), 0);
    assert!(orders.is_cancelled());
}

#[tokio::test]
async fn test_nothing_is_processed_without_downstream_demand() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(16);

    // Act: a matching pair arrives before any demand
    orders.on_next(order(1, "alice"));
    shipments.on_next(shipment(1, "truck"));

    // Assert
    assert_eq!(recorder.value_count(), 0);

    // Act
    subscription.request(1);

    // Assert: queued arrivals are replayed against the new demand
    assert_eq!(recorder.values(), vec![delivery(1, "alice", "truck")]);
}

#[tokio::test]
async fn test_match_uses_combiner_output() {
    // Arrange: a combiner that is not a plain constructor
    let orders = SingleSubject::new();
    let shipments = SingleSubject::new();
    let recorder = Arc::new(RecordingSubscriber::new());

    let subscription = match_with(
        orders.clone(),
        shipments.clone(),
        |o: &Order| Ok(o.id),
        |s: &Shipment| Ok(s.order_id),
        |o: Order, s: Shipment| Ok(format!("{} via {}", o.customer, s.carrier)),
        16,
    )
    .subscribe(recorder.clone());
    subscription.request(demand::UNBOUNDED);

    // Act
    orders.on_next(order(7, "alice"));
    shipments.on_next(shipment(7, "truck"));

    // Assert
    assert_eq!(recorder.values(), vec!["alice via truck".to_owned()]);
}

#[test]
#[should_panic(expected = "batch_size")]
fn test_zero_batch_size_panics() {
    let orders: SingleSubject<Order> = SingleSubject::new();
    let shipments: SingleSubject<Shipment> = SingleSubject::new();

    let _ = match_with(
        orders,
        shipments,
        |o: &Order| Ok(o.id),
        |s: &Shipment| Ok(s.order_id),
        |o, s| Ok(Delivery::from_parts(o, s)),
        0,
    );
}
