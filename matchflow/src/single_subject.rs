// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A push-style entry point for imperative producers.
//!
//! [`SingleSubject`] is both a producer handle and a [`Source`]: clone it,
//! hand one clone to [`crate::match_with`], and push values through the
//! other. It admits exactly one subscriber; a second subscription attempt
//! is refused with an immediate error rather than splitting the sequence.
//!
//! The subject is a hot source: it does not buffer, and pushes made while
//! no subscriber is attached (or after cancellation) are dropped. Requested
//! demand is recorded but not enforced, which is what makes the subject
//! useful for observing an operator's re-requesting behavior.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use matchflow_core::{demand, FlowError, Source, Subscriber, Subscription};

struct Inner<T> {
    subscriber: Mutex<Option<Arc<dyn Subscriber<T>>>>,
    /// Cumulative demand ever requested through the subscription.
    requested: AtomicU64,
    subscribed: AtomicBool,
    cancelled: AtomicBool,
    terminated: AtomicBool,
}

pub struct SingleSubject<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SingleSubject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Default for SingleSubject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> SingleSubject<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                subscriber: Mutex::new(None),
                requested: AtomicU64::new(0),
                subscribed: AtomicBool::new(false),
                cancelled: AtomicBool::new(false),
                terminated: AtomicBool::new(false),
            }),
        }
    }

    /// Pushes one value to the subscriber, if any. Dropped when no
    /// subscriber is attached, after cancellation, or after a terminal.
    pub fn on_next(&self, item: T) {
        if self.inner.terminated.load(Ordering::Acquire)
            || self.inner.cancelled.load(Ordering::Acquire)
        {
            return;
        }
        // clone out of the lock: the subscriber may cancel us re-entrantly
        let subscriber = self.inner.subscriber.lock().clone();
        if let Some(subscriber) = subscriber {
            subscriber.on_next(item);
        }
    }

    /// Completes the sequence. Only the first terminal signal is delivered.
    pub fn on_completed(&self) {
        if self.inner.terminated.swap(true, Ordering::AcqRel)
            || self.inner.cancelled.load(Ordering::Acquire)
        {
            return;
        }
        let subscriber = self.inner.subscriber.lock().take();
        if let Some(subscriber) = subscriber {
            subscriber.on_completed();
        }
    }

    /// Fails the sequence. Only the first terminal signal is delivered.
    pub fn on_error(&self, error: FlowError) {
        if self.inner.terminated.swap(true, Ordering::AcqRel)
            || self.inner.cancelled.load(Ordering::Acquire)
        {
            return;
        }
        let subscriber = self.inner.subscriber.lock().take();
        if let Some(subscriber) = subscriber {
            subscriber.on_error(error);
        }
    }

    /// Total demand requested through the subscription so far.
    pub fn requested(&self) -> u64 {
        self.inner.requested.load(Ordering::Acquire)
    }

    /// Whether the subscriber has cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Whether a subscriber is currently attached.
    pub fn has_subscriber(&self) -> bool {
        self.inner.subscriber.lock().is_some()
    }
}

impl<T: Send + 'static> Source<T> for SingleSubject<T> {
    fn subscribe(self, subscriber: Arc<dyn Subscriber<T>>) -> Box<dyn Subscription> {
        if self.inner.subscribed.swap(true, Ordering::AcqRel) {
            subscriber.on_error(FlowError::source_error(
                "SingleSubject admits only one subscriber".to_owned(),
            ));
            return Box::new(RefusedSubscription);
        }
        *self.inner.subscriber.lock() = Some(subscriber);
        Box::new(SubjectSubscription {
            inner: self.inner,
        })
    }
}

struct SubjectSubscription<T> {
    inner: Arc<Inner<T>>,
}

impl<T: Send + 'static> Subscription for SubjectSubscription<T> {
    fn request(&self, n: u64) {
        if n == 0 {
            crate::warn!("SingleSubject: request(0) violates the demand contract; ignored");
            return;
        }
        demand::add(&self.inner.requested, n);
    }

    fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.subscriber.lock().take();
    }
}

/// Subscription handed to a refused second subscriber; every operation is
/// a no-op.
struct RefusedSubscription;

impl Subscription for RefusedSubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}
}
