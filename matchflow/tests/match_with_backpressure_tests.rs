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
async fn test_emits_no_more_than_requested() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(16);
    subscription.request(1);

    // Act: two matchable pairs arrive against a demand of one
    orders.on_next(order(1, "alice"));
    orders.on_next(order(2, "bob"));
    shipments.on_next(shipment(1, "truck"));
    shipments.on_next(shipment(2, "ship"));

    // Assert
    assert_eq!(recorder.values(), vec![delivery(1, "alice", "truck")]);

    // Act
    subscription.request(1);

    // Assert: the second match was held back, not lost
    assert_eq!(
        recorder.values(),
        vec![delivery(1, "alice", "truck"), delivery(2, "bob", "ship")]
    );
}

#[tokio::test]
async fn test_unbounded_demand_emits_everything() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(4);
    subscription.request(demand::UNBOUNDED);

    // Act
    for id in 1..=8 {
        orders.on_next(order(id, "alice"));
        shipments.on_next(shipment(id, "truck"));
    }

    // Assert
    assert_eq!(recorder.value_count(), 8);
}

#[tokio::test]
async fn test_request_zero_is_ignored() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(16);

    // Act
    subscription.request(0);
    orders.on_next(order(1, "alice"));
    shipments.on_next(shipment(1, "truck"));

    // Assert
    assert_eq!(recorder.value_count(), 0);

    // Act: a real request still works afterwards
    subscription.request(2);
    assert_eq!(recorder.values(), vec![delivery(1, "alice", "truck")]);
}

#[tokio::test]
async fn test_initial_upstream_demand_is_one_batch_per_side() {
    // Arrange / Act
    let (orders, shipments, _recorder, _subscription) = setup(2);

    // Assert
    assert_eq!(orders.requested(), 2);
    assert_eq!(shipments.requested(), 2);
}

#[tokio::test]
async fn test_both_sides_replenished_in_lockstep() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(2);
    subscription.request(demand::UNBOUNDED);

    // Act: one full batch on the order side alone
    orders.on_next(order(1, "alice"));
    orders.on_next(order(2, "bob"));

    // Assert: no replenishment until the shipment side catches up
    assert_eq!(orders.requested(), 2);
    assert_eq!(shipments.requested(), 2);

    // Act
    shipments.on_next(shipment(1, "truck"));
    shipments.on_next(shipment(2, "ship"));

    // Assert: both batches were consumed, both sides re-requested
    assert_eq!(recorder.value_count(), 2);
    assert_eq!(orders.requested(), 4);
    assert_eq!(shipments.requested(), 4);
}

#[tokio::test]
async fn test_live_side_replenished_alone_after_the_other_completes() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(2);
    subscription.request(demand::UNBOUNDED);

    // Act: the shipment side completes leaving one unmatched shipment
    shipments.on_next(shipment(99, "truck"));
    shipments.on_completed();

    // Assert: the join stays alive waiting for the matching order
    assert!(!recorder.is_completed());
    assert!(shipments.is_cancelled());

    // Act: a full order batch with no match
    orders.on_next(order(1, "alice"));
    orders.on_next(order(2, "bob"));

    // Assert: the order side is replenished without a shipment batch
    assert_eq!(orders.requested(), 4);
    assert_eq!(shipments.requested(), 2);

    // Act: the matching order drains the last shipment and ends the join
    orders.on_next(order(99, "carol"));

    // Assert
    assert_eq!(recorder.values(), vec![delivery(99, "carol", "truck")]);
    assert!(recorder.is_completed());
    assert!(orders.is_cancelled());
}

#[tokio::test]
async fn test_cancel_stops_processing() {
    // Arrange
    let (orders, shipments, recorder, subscription) = setup(16);
    subscription.request(demand::UNBOUNDED);

    orders.on_next(order(1, "alice"));

    // Act
    subscription.cancel();
    shipments.on_next(shipment(1, "truck"));

    // Assert
    assert_eq!(recorder.value_count(), 0);
    assert_eq!(recorder.terminal_count(), 0);
    assert!(orders.is_cancelled());
    assert!(shipments.is_cancelled());
}
