// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::time::Duration;

use futures::stream::StreamExt;
use futures::Stream;
use tokio::time::sleep;

/// Asserts that `stream` emits nothing within `timeout_ms` milliseconds.
pub async fn assert_no_element_emitted<S, T>(stream: &mut S, timeout_ms: u64)
where
    S: Stream<Item = T> + Unpin,
{
    tokio::select! {
        _item = stream.next() => {
            panic!("unexpected element emitted, expected no output");
        }
        _ = sleep(Duration::from_millis(timeout_ms)) => {}
    }
}

/// Yields long enough for background pump tasks to settle.
pub async fn settle() {
    sleep(Duration::from_millis(50)).await;
}
