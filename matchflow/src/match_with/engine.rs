// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The serialized core of the match operator.
//!
//! Both source adapters and the downstream `request` path funnel into
//! [`Engine::drain`]. Arrivals are only ever enqueued onto the lock-free
//! event queue; the caller that takes the `wip` reentrancy counter from
//! zero to one becomes the sole drainer and processes events until demand
//! or the queue runs out. A trigger that arrives mid-drain leaves the
//! counter above one, making the drainer re-enter instead of the trigger
//! racing in. This serializes all state mutation without blocking any
//! producer thread.
//!
//! The drainer-owned state (match index, completion state, request
//! counters) sits behind a mutex that only the active drainer locks;
//! producers never touch it, so the lock is uncontended by construction and
//! exists to make the single-owner discipline safe rather than to arbitrate
//! contention.
//!
//! Terminal paths (completion, failure, observed cancellation) return
//! without decrementing `wip`, permanently parking the loop so no queued
//! event can be processed after the terminal signal.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam_queue::SegQueue;
use parking_lot::Mutex;

use matchflow_core::error::BoxError;
use matchflow_core::{demand, FlowError, Side, Subscriber, Subscription};

use super::event::SourceEvent;

/// Joint completion status of the two sources. Only advances forward;
/// `Both` is reachable only through one of the single-side states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Neither,
    OnlyA,
    OnlyB,
    Both,
}

impl Completion {
    fn advance(self, side: Side) -> Self {
        match (self, side) {
            (Self::Neither, Side::A) => Self::OnlyA,
            (Self::Neither, Side::B) => Self::OnlyB,
            (Self::OnlyB, Side::A) | (Self::OnlyA, Side::B) => Self::Both,
            // a duplicate completion for the same side cannot regress
            (state, _) => state,
        }
    }
}

/// Result of processing one value event.
enum Processed {
    Emitted,
    Cached,
    Finished,
}

/// Result of processing one completion event.
enum Outcome {
    Finished,
    KeepGoing,
}

/// State owned by whichever pass currently holds drain ownership.
struct DrainState<A, B, K, FKA, FKB, FC> {
    key_a: FKA,
    key_b: FKB,
    combiner: FC,
    /// Side A items awaiting a key-equal partner from side B.
    pending_a: HashMap<K, VecDeque<A>>,
    /// Side B items awaiting a key-equal partner from side A.
    pending_b: HashMap<K, VecDeque<B>>,
    completed: Completion,
    /// Items processed from each side since that side's demand was last
    /// replenished.
    consumed_a: u64,
    consumed_b: u64,
    /// Set once unbounded demand has been observed; short-circuits all
    /// further demand bookkeeping.
    request_all: bool,
}

pub(crate) struct Engine<A, B, K, C, FKA, FKB, FC> {
    queue: SegQueue<SourceEvent<A, B>>,
    /// Outstanding downstream demand, saturating at the unbounded sentinel.
    requested: AtomicU64,
    /// Drain ownership: zero means idle, the 0->1 transition elects the
    /// drainer, and a terminal path leaves it elevated forever.
    wip: AtomicUsize,
    cancelled: AtomicBool,
    downstream: Arc<dyn Subscriber<C>>,
    upstream_a: OnceLock<Box<dyn Subscription>>,
    upstream_b: OnceLock<Box<dyn Subscription>>,
    batch_size: u64,
    state: Mutex<DrainState<A, B, K, FKA, FKB, FC>>,
}

impl<A, B, K, C, FKA, FKB, FC> Engine<A, B, K, C, FKA, FKB, FC>
where
    A: Send + 'static,
    B: Send + 'static,
    K: Eq + Hash + Send + 'static,
    C: Send + 'static,
    FKA: Fn(&A) -> Result<K, BoxError> + Send + 'static,
    FKB: Fn(&B) -> Result<K, BoxError> + Send + 'static,
    FC: FnMut(A, B) -> Result<C, BoxError> + Send + 'static,
{
    pub(crate) fn new(
        key_a: FKA,
        key_b: FKB,
        combiner: FC,
        downstream: Arc<dyn Subscriber<C>>,
        batch_size: u64,
    ) -> Self {
        Self {
            queue: SegQueue::new(),
            requested: AtomicU64::new(0),
            wip: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
            downstream,
            upstream_a: OnceLock::new(),
            upstream_b: OnceLock::new(),
            batch_size,
            state: Mutex::new(DrainState {
                key_a,
                key_b,
                combiner,
                pending_a: HashMap::new(),
                pending_b: HashMap::new(),
                completed: Completion::Neither,
                consumed_a: 0,
                consumed_b: 0,
                request_all: false,
            }),
        }
    }

    /// Stores the upstream subscriptions and issues the initial demand of
    /// one batch per side.
    pub(crate) fn attach_upstreams(
        &self,
        upstream_a: Box<dyn Subscription>,
        upstream_b: Box<dyn Subscription>,
    ) {
        let _ = self.upstream_a.set(upstream_a);
        let _ = self.upstream_b.set(upstream_b);
        self.request_upstream(Side::A, self.batch_size);
        self.request_upstream(Side::B, self.batch_size);
    }

    /// Enqueues one event and triggers a drain. The only entry point the
    /// source adapters use; never blocks.
    fn offer(&self, event: SourceEvent<A, B>) {
        self.queue.push(event);
        self.drain();
    }

    fn drain(&self) {
        if self.wip.fetch_add(1, Ordering::AcqRel) != 0 {
            // another pass is active and will observe our trigger
            return;
        }
        loop {
            let mut state = self.state.lock();
            let mut available = if state.request_all {
                demand::UNBOUNDED
            } else {
                let requested = self.requested.load(Ordering::Acquire);
                if requested == demand::UNBOUNDED {
                    state.request_all = true;
                }
                requested
            };
            let mut emitted: u64 = 0;
            while available > emitted {
                if self.cancelled.load(Ordering::Acquire) {
                    // cancellation parks the loop; wip stays elevated
                    return;
                }
                let Some(event) = self.queue.pop() else { break };
                match event {
                    SourceEvent::ItemA(item) => match self.process_a(&mut state, item) {
                        Processed::Finished => return,
                        Processed::Emitted => emitted += 1,
                        Processed::Cached => {}
                    },
                    SourceEvent::ItemB(item) => match self.process_b(&mut state, item) {
                        Processed::Finished => return,
                        Processed::Emitted => emitted += 1,
                        Processed::Cached => {}
                    },
                    SourceEvent::Completed(side) => {
                        if let Outcome::Finished = self.process_completed(&mut state, side) {
                            return;
                        }
                    }
                    SourceEvent::Failed(error) => {
                        self.clear(&mut state);
                        self.downstream.on_error(error);
                        return;
                    }
                }
                if available == demand::UNBOUNDED {
                    emitted = 0;
                } else if available == emitted {
                    // this pass's demand is spent; settle and re-read
                    available = demand::produced(&self.requested, emitted);
                    emitted = 0;
                }
            }
            if emitted > 0 {
                // queue ran dry before the demand did
                demand::produced(&self.requested, emitted);
            }
            drop(state);
            if self.wip.fetch_sub(1, Ordering::AcqRel) == 1 {
                break;
            }
        }
    }

    /// Processes one side-A arrival: match against side B's pending items
    /// or cache it, then run the termination and replenishment checks.
    fn process_a(&self, state: &mut DrainState<A, B, K, FKA, FKB, FC>, item: A) -> Processed {
        let key = match (state.key_a)(&item) {
            Ok(key) => key,
            Err(e) => {
                self.abort(state, FlowError::key_extraction(e));
                return Processed::Finished;
            }
        };
        let matched = state
            .pending_b
            .get_mut(&key)
            .and_then(|queue| queue.pop_front().map(|partner| (partner, queue.is_empty())));
        let result = if let Some((partner, drained)) = matched {
            if drained {
                state.pending_b.remove(&key);
            }
            match (state.combiner)(item, partner) {
                Ok(output) => {
                    self.downstream.on_next(output);
                    Processed::Emitted
                }
                Err(e) => {
                    self.abort(state, FlowError::combine(e));
                    return Processed::Finished;
                }
            }
        } else {
            state.pending_a.entry(key).or_default().push_back(item);
            Processed::Cached
        };
        // with B complete and nothing of B left to match, no further
        // pairing is possible
        if state.completed == Completion::OnlyB && state.pending_b.is_empty() {
            self.clear(state);
            self.downstream.on_completed();
            return Processed::Finished;
        }
        state.consumed_a += 1;
        self.replenish(state);
        result
    }

    /// Mirror of [`Self::process_a`] for side-B arrivals.
    fn process_b(&self, state: &mut DrainState<A, B, K, FKA, FKB, FC>, item: B) -> Processed {
        let key = match (state.key_b)(&item) {
            Ok(key) => key,
            Err(e) => {
                self.abort(state, FlowError::key_extraction(e));
                return Processed::Finished;
            }
        };
        let matched = state
            .pending_a
            .get_mut(&key)
            .and_then(|queue| queue.pop_front().map(|partner| (partner, queue.is_empty())));
        let result = if let Some((partner, drained)) = matched {
            if drained {
                state.pending_a.remove(&key);
            }
            // natural argument order: the A item first
            match (state.combiner)(partner, item) {
                Ok(output) => {
                    self.downstream.on_next(output);
                    Processed::Emitted
                }
                Err(e) => {
                    self.abort(state, FlowError::combine(e));
                    return Processed::Finished;
                }
            }
        } else {
            state.pending_b.entry(key).or_default().push_back(item);
            Processed::Cached
        };
        if state.completed == Completion::OnlyA && state.pending_a.is_empty() {
            self.clear(state);
            self.downstream.on_completed();
            return Processed::Finished;
        }
        state.consumed_b += 1;
        self.replenish(state);
        result
    }

    /// Advances the completion state machine for `side` and decides whether
    /// the whole join is done.
    ///
    /// Note the asymmetry with the value path: a side that completes with
    /// none of its *own* items pending ends the join even while the other
    /// side still holds unmatched items; those are silently discarded.
    fn process_completed(
        &self,
        state: &mut DrainState<A, B, K, FKA, FKB, FC>,
        side: Side,
    ) -> Outcome {
        state.completed = state.completed.advance(side);
        self.cancel_upstream(side);
        let done = match side {
            Side::A => {
                state.completed == Completion::Both
                    || (state.completed == Completion::OnlyA && state.pending_a.is_empty())
            }
            Side::B => {
                state.completed == Completion::Both
                    || (state.completed == Completion::OnlyB && state.pending_b.is_empty())
            }
        };
        if done {
            self.clear(state);
            self.downstream.on_completed();
            Outcome::Finished
        } else {
            self.replenish(state);
            Outcome::KeepGoing
        }
    }

    /// Replenishes upstream demand in whole batches. While both sides are
    /// live, both counters must fill before either side is replenished,
    /// which keeps the two sources advancing in lockstep.
    fn replenish(&self, state: &mut DrainState<A, B, K, FKA, FKB, FC>) {
        let batch = self.batch_size;
        if state.consumed_a == batch && state.completed == Completion::OnlyB {
            state.consumed_a = 0;
            self.request_upstream(Side::A, batch);
        } else if state.consumed_b == batch && state.completed == Completion::OnlyA {
            state.consumed_b = 0;
            self.request_upstream(Side::B, batch);
        } else if state.consumed_a == batch && state.consumed_b == batch {
            state.consumed_a = 0;
            state.consumed_b = 0;
            self.request_upstream(Side::A, batch);
            self.request_upstream(Side::B, batch);
        }
    }

    /// Discards all cached state and detaches from both upstreams. Runs on
    /// every terminal path before the terminal signal is delivered.
    fn clear(&self, state: &mut DrainState<A, B, K, FKA, FKB, FC>) {
        crate::trace!("match_with: terminal reached, discarding cached state");
        state.pending_a.clear();
        state.pending_b.clear();
        while self.queue.pop().is_some() {}
        self.cancel_upstream(Side::A);
        self.cancel_upstream(Side::B);
    }

    fn abort(&self, state: &mut DrainState<A, B, K, FKA, FKB, FC>, error: FlowError) {
        self.clear(state);
        self.downstream.on_error(error);
    }

    fn request_upstream(&self, side: Side, n: u64) {
        let slot = match side {
            Side::A => &self.upstream_a,
            Side::B => &self.upstream_b,
        };
        if let Some(subscription) = slot.get() {
            crate::trace!("replenishing side {side} by {n}");
            subscription.request(n);
        }
    }

    fn cancel_upstream(&self, side: Side) {
        let slot = match side {
            Side::A => &self.upstream_a,
            Side::B => &self.upstream_b,
        };
        if let Some(subscription) = slot.get() {
            subscription.cancel();
        }
    }
}

/// Type-erased control surface so [`super::MatchSubscription`] does not
/// carry the engine's generics.
pub(crate) trait EngineControl: Send + Sync {
    fn request(&self, n: u64);
    fn cancel(&self);
}

impl<A, B, K, C, FKA, FKB, FC> EngineControl for Engine<A, B, K, C, FKA, FKB, FC>
where
    A: Send + 'static,
    B: Send + 'static,
    K: Eq + Hash + Send + 'static,
    C: Send + 'static,
    FKA: Fn(&A) -> Result<K, BoxError> + Send + 'static,
    FKB: Fn(&B) -> Result<K, BoxError> + Send + 'static,
    FC: FnMut(A, B) -> Result<C, BoxError> + Send + 'static,
{
    fn request(&self, n: u64) {
        if n == 0 {
            crate::warn!("match_with: request(0) violates the demand contract; ignored");
            return;
        }
        demand::add(&self.requested, n);
        self.drain();
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.cancel_upstream(Side::A);
        self.cancel_upstream(Side::B);
    }
}

/// Side-A adapter: converts subscriber notifications into tagged events.
/// Only ever enqueues and triggers; all stateful work happens in the drain.
pub(crate) struct AdapterA<A, B, K, C, FKA, FKB, FC> {
    engine: Arc<Engine<A, B, K, C, FKA, FKB, FC>>,
}

impl<A, B, K, C, FKA, FKB, FC> AdapterA<A, B, K, C, FKA, FKB, FC> {
    pub(crate) fn new(engine: Arc<Engine<A, B, K, C, FKA, FKB, FC>>) -> Self {
        Self { engine }
    }
}

impl<A, B, K, C, FKA, FKB, FC> Subscriber<A> for AdapterA<A, B, K, C, FKA, FKB, FC>
where
    A: Send + 'static,
    B: Send + 'static,
    K: Eq + Hash + Send + 'static,
    C: Send + 'static,
    FKA: Fn(&A) -> Result<K, BoxError> + Send + 'static,
    FKB: Fn(&B) -> Result<K, BoxError> + Send + 'static,
    FC: FnMut(A, B) -> Result<C, BoxError> + Send + 'static,
{
    fn on_next(&self, item: A) {
        self.engine.offer(SourceEvent::ItemA(item));
    }

    fn on_completed(&self) {
        self.engine.offer(SourceEvent::Completed(Side::A));
    }

    fn on_error(&self, error: FlowError) {
        self.engine
            .offer(SourceEvent::Failed(FlowError::upstream(Side::A, error)));
    }
}

/// Side-B adapter; mirror of [`AdapterA`].
pub(crate) struct AdapterB<A, B, K, C, FKA, FKB, FC> {
    engine: Arc<Engine<A, B, K, C, FKA, FKB, FC>>,
}

impl<A, B, K, C, FKA, FKB, FC> AdapterB<A, B, K, C, FKA, FKB, FC> {
    pub(crate) fn new(engine: Arc<Engine<A, B, K, C, FKA, FKB, FC>>) -> Self {
        Self { engine }
    }
}

impl<A, B, K, C, FKA, FKB, FC> Subscriber<B> for AdapterB<A, B, K, C, FKA, FKB, FC>
where
    A: Send + 'static,
    B: Send + 'static,
    K: Eq + Hash + Send + 'static,
    C: Send + 'static,
    FKA: Fn(&A) -> Result<K, BoxError> + Send + 'static,
    FKB: Fn(&B) -> Result<K, BoxError> + Send + 'static,
    FC: FnMut(A, B) -> Result<C, BoxError> + Send + 'static,
{
    fn on_next(&self, item: B) {
        self.engine.offer(SourceEvent::ItemB(item));
    }

    fn on_completed(&self) {
        self.engine.offer(SourceEvent::Completed(Side::B));
    }

    fn on_error(&self, error: FlowError) {
        self.engine
            .offer(SourceEvent::Failed(FlowError::upstream(Side::B, error)));
    }
}
