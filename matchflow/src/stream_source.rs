// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Adapts a `futures::Stream` of [`StreamItem`]s into a demand-driven
//! [`Source`].
//!
//! Subscribing spawns a pump task that pulls one item from the stream per
//! unit of granted demand, so a well-behaved stream is never polled ahead
//! of what the subscriber asked for. An in-band [`StreamItem::Error`]
//! becomes `on_error`; stream exhaustion becomes `on_completed`; both end
//! the pump.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::Notify;

use matchflow_core::{demand, Source, StreamItem, Subscriber, Subscription};

pub struct StreamSource<S> {
    stream: S,
}

impl<S> StreamSource<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

struct Shared {
    /// Granted but not yet consumed demand.
    credits: AtomicU64,
    wake: Notify,
    cancelled: AtomicBool,
}

impl<S, T> Source<T> for StreamSource<S>
where
    S: Stream<Item = StreamItem<T>> + Send + Unpin + 'static,
    T: Send + 'static,
{
    /// Starts the pump task. Must be called from within a tokio runtime.
    fn subscribe(self, subscriber: Arc<dyn Subscriber<T>>) -> Box<dyn Subscription> {
        let shared = Arc::new(Shared {
            credits: AtomicU64::new(0),
            wake: Notify::new(),
            cancelled: AtomicBool::new(false),
        });
        let task = tokio::spawn(pump(self.stream, Arc::clone(&shared), subscriber));
        Box::new(StreamSubscription { shared, task })
    }
}

async fn pump<S, T>(mut stream: S, shared: Arc<Shared>, subscriber: Arc<dyn Subscriber<T>>)
where
    S: Stream<Item = StreamItem<T>> + Send + Unpin + 'static,
    T: Send + 'static,
{
    loop {
        while !demand::take_one(&shared.credits) {
            if shared.cancelled.load(Ordering::Acquire) {
                return;
            }
            shared.wake.notified().await;
        }
        if shared.cancelled.load(Ordering::Acquire) {
            return;
        }
        match stream.next().await {
            Some(StreamItem::Value(item)) => subscriber.on_next(item),
            Some(StreamItem::Error(error)) => {
                subscriber.on_error(error);
                return;
            }
            None => {
                subscriber.on_completed();
                return;
            }
        }
    }
}

struct StreamSubscription {
    shared: Arc<Shared>,
    task: tokio::task::JoinHandle<()>,
}

impl Subscription for StreamSubscription {
    fn request(&self, n: u64) {
        if n == 0 {
            crate::warn!("StreamSource: request(0) violates the demand contract; ignored");
            return;
        }
        demand::add(&self.shared.credits, n);
        self.shared.wake.notify_one();
    }

    fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::Release);
        self.shared.wake.notify_one();
        self.task.abort();
    }
}
