// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The pull-protocol seams: [`Subscriber`] receives notifications,
//! [`Subscription`] carries demand and cancellation back upstream.
//!
//! The contract mirrors reactive-pull semantics: a subscriber receives zero
//! or more `on_next` calls, each covered by previously requested demand,
//! followed by at most one terminal signal: either `on_completed` or
//! `on_error`, never both.

use std::sync::Arc;

use crate::error::FlowError;

/// Receives the notifications of a demand-driven sequence.
///
/// Implementations take `&self`: notifications may arrive from whichever
/// thread the producing side runs on, so state updates use interior
/// mutability.
pub trait Subscriber<T>: Send + Sync {
    /// Delivers one value. Only called while requested demand is
    /// outstanding.
    fn on_next(&self, item: T);

    /// Signals normal completion. The terminal signal; nothing follows.
    fn on_completed(&self);

    /// Signals failure. The terminal signal; nothing follows.
    fn on_error(&self, error: FlowError);
}

impl<T, S: Subscriber<T> + ?Sized> Subscriber<T> for Arc<S> {
    fn on_next(&self, item: T) {
        (**self).on_next(item);
    }

    fn on_completed(&self) {
        (**self).on_completed();
    }

    fn on_error(&self, error: FlowError) {
        (**self).on_error(error);
    }
}

/// The upstream-facing half of a subscription.
pub trait Subscription: Send + Sync {
    /// Requests `n` more items. `n == 0` is a contract violation and is
    /// ignored; [`crate::demand::UNBOUNDED`] disables demand bookkeeping
    /// for the rest of the sequence.
    fn request(&self, n: u64);

    /// Cancels the subscription. Cooperative and idempotent: an in-flight
    /// delivery may still complete.
    fn cancel(&self);
}

impl<S: Subscription + ?Sized> Subscription for Arc<S> {
    fn request(&self, n: u64) {
        (**self).request(n);
    }

    fn cancel(&self) {
        (**self).cancel();
    }
}
