// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::Arc;

use matchflow_core::{FlowError, Subscriber};
use matchflow_test_utils::fixtures::{delivery, order, shipment, Delivery};
use matchflow_test_utils::RecordingSubscriber;

#[tokio::test]
async fn test_records_values_and_completion() {
    // Arrange
    let recorder: RecordingSubscriber<i32> = RecordingSubscriber::new();

    // Act
    recorder.on_next(1);
    recorder.on_next(2);
    recorder.on_completed();

    // Assert
    assert_eq!(recorder.values(), vec![1, 2]);
    assert!(recorder.is_completed());
    assert!(recorder.error().is_none());
    assert_eq!(recorder.terminal_count(), 1);
}

#[tokio::test]
async fn test_counts_every_terminal_signal() {
    // Arrange
    let recorder: RecordingSubscriber<i32> = RecordingSubscriber::new();

    // Act: a misbehaving producer signals twice
    recorder.on_completed();
    recorder.on_error(FlowError::source_error("late"));

    // Assert: both are visible, so tests can flag the violation
    assert_eq!(recorder.terminal_count(), 2);
}

#[tokio::test]
async fn test_waiters_see_notifications_from_another_task() {
    // Arrange
    let recorder: Arc<RecordingSubscriber<i32>> = Arc::new(RecordingSubscriber::new());
    let pusher = Arc::clone(&recorder);

    // Act
    tokio::spawn(async move {
        pusher.on_next(7);
        pusher.on_completed();
    });

    // Assert
    recorder.wait_for_values(1).await;
    recorder.wait_for_completion().await;
    assert_eq!(recorder.values(), vec![7]);
}

#[test]
fn test_delivery_combines_order_and_shipment() {
    let d = Delivery::from_parts(order(3, "alice"), shipment(3, "truck"));

    assert_eq!(d, delivery(3, "alice", "truck"));
}
