// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::sync::Arc;

use crate::subscriber::{Subscriber, Subscription};

/// A demand-driven producer of values.
///
/// Subscribing hands the source a [`Subscriber`] and returns the
/// [`Subscription`] through which the consumer governs it. A conforming
/// source delivers `on_next` only against outstanding requested demand and
/// ends with at most one terminal signal.
///
/// `subscribe` consumes the source: a source feeds exactly one subscriber.
/// Sources that support sharing (such as a subject) hand out cheap clones
/// instead.
pub trait Source<T> {
    /// Attaches `subscriber` and starts the source.
    fn subscribe(self, subscriber: Arc<dyn Subscriber<T>>) -> Box<dyn Subscription>;
}
