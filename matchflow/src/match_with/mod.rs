// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The key-based join (match) operator.
//!
//! [`match_with`] pairs items from two independently-produced sequences by
//! key equality: each arrival either matches the oldest waiting item of the
//! other side with the same key (the pair is combined and emitted) or is
//! appended to its own side's per-key FIFO queue to wait for a partner.
//!
//! # Behavior
//!
//! - Matches are FIFO per key: the oldest cached item of a key matches
//!   first, and no item is ever combined twice.
//! - The output honors requested demand; a request of
//!   [`matchflow_core::demand::UNBOUNDED`] disables bookkeeping for the
//!   rest of the sequence.
//! - Upstream demand is re-requested in `batch_size` chunks, both sides in
//!   lockstep while both are live, so neither source can race arbitrarily
//!   far ahead of the other.
//! - When one side completes with no items of its own still waiting, the
//!   join completes: the other side's unmatched items are discarded without
//!   being reported. This mirrors the completion rules of the join, not an
//!   error condition.
//! - Any failure (an upstream error, a key extractor error, a combiner
//!   error) terminates the join immediately with a single `on_error`;
//!   cached items are discarded and both upstreams are cancelled.
//!
//! # Concurrency
//!
//! Arrivals from both sources are serialized through a lock-free event
//! queue drained by a single-flight loop; see [`engine`] for the protocol.

pub(crate) mod engine;
mod event;
mod output;

use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use matchflow_core::error::BoxError;
use matchflow_core::{Source, Subscriber, Subscription};

use self::engine::{AdapterA, AdapterB, Engine, EngineControl};
pub use self::output::MatchOutputStream;

/// Creates a match pipeline over `source_a` and `source_b`.
///
/// `key_a` and `key_b` extract the join key from each side; `combiner`
/// produces one output value per key-equal pair, taking the pair in natural
/// argument order. `batch_size` is the upstream re-request granularity and
/// bounds how far the pending-match index of one side can grow relative to
/// the other.
///
/// The pipeline is inert until [`MatchWith::subscribe`] (or
/// [`MatchWith::into_stream`]) is called.
///
/// # Panics
///
/// Panics if `batch_size` is zero.
pub fn match_with<A, B, K, C, SA, SB, FKA, FKB, FC>(
    source_a: SA,
    source_b: SB,
    key_a: FKA,
    key_b: FKB,
    combiner: FC,
    batch_size: u64,
) -> MatchWith<A, B, K, C, SA, SB, FKA, FKB, FC>
where
    SA: Source<A>,
    SB: Source<B>,
    A: Send + 'static,
    B: Send + 'static,
    K: Eq + Hash + Send + 'static,
    C: Send + 'static,
    FKA: Fn(&A) -> Result<K, BoxError> + Send + 'static,
    FKB: Fn(&B) -> Result<K, BoxError> + Send + 'static,
    FC: FnMut(A, B) -> Result<C, BoxError> + Send + 'static,
{
    assert!(batch_size >= 1, "batch_size must be >= 1");
    MatchWith {
        source_a,
        source_b,
        key_a,
        key_b,
        combiner,
        batch_size,
        _marker: PhantomData,
    }
}

/// An unsubscribed match pipeline; see [`match_with`].
pub struct MatchWith<A, B, K, C, SA, SB, FKA, FKB, FC> {
    source_a: SA,
    source_b: SB,
    key_a: FKA,
    key_b: FKB,
    combiner: FC,
    batch_size: u64,
    _marker: PhantomData<fn() -> (A, B, K, C)>,
}

impl<A, B, K, C, SA, SB, FKA, FKB, FC> MatchWith<A, B, K, C, SA, SB, FKA, FKB, FC>
where
    SA: Source<A>,
    SB: Source<B>,
    A: Send + 'static,
    B: Send + 'static,
    K: Eq + Hash + Send + 'static,
    C: Send + 'static,
    FKA: Fn(&A) -> Result<K, BoxError> + Send + 'static,
    FKB: Fn(&B) -> Result<K, BoxError> + Send + 'static,
    FC: FnMut(A, B) -> Result<C, BoxError> + Send + 'static,
{
    /// Subscribes `subscriber` to the join output and starts both sources
    /// with an initial upstream demand of `batch_size` each.
    ///
    /// Nothing is emitted until demand is requested through the returned
    /// subscription.
    pub fn subscribe(self, subscriber: Arc<dyn Subscriber<C>>) -> MatchSubscription {
        crate::trace!("match_with: subscribing with batch size {}", self.batch_size);
        let engine = Arc::new(Engine::new(
            self.key_a,
            self.key_b,
            self.combiner,
            subscriber,
            self.batch_size,
        ));

        let a = self
            .source_a
            .subscribe(Arc::new(AdapterA::new(Arc::clone(&engine))));
        let b = self
            .source_b
            .subscribe(Arc::new(AdapterB::new(Arc::clone(&engine))));
        engine.attach_upstreams(a, b);

        MatchSubscription { engine }
    }

    pub(crate) fn batch_size(&self) -> u64 {
        self.batch_size
    }
}

/// The downstream handle of a running match pipeline.
pub struct MatchSubscription {
    engine: Arc<dyn EngineControl>,
}

impl Subscription for MatchSubscription {
    fn request(&self, n: u64) {
        self.engine.request(n);
    }

    fn cancel(&self) {
        self.engine.cancel();
    }
}
