// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Bridges the subscriber protocol to a `futures::Stream` consumer.

use std::hash::Hash;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;

use matchflow_core::error::BoxError;
use matchflow_core::{FlowError, Source, StreamItem, Subscriber, Subscription};

use super::{MatchSubscription, MatchWith};

/// Forwards join output into an unbounded channel. The channel is only a
/// hand-off buffer; the stream side keeps at most one item of demand
/// outstanding beyond its batch, so it never grows past the batch size.
struct ChannelSubscriber<C> {
    tx: async_channel::Sender<StreamItem<C>>,
}

impl<C: Send + 'static> Subscriber<C> for ChannelSubscriber<C> {
    fn on_next(&self, item: C) {
        let _ = self.tx.try_send(StreamItem::Value(item));
    }

    fn on_completed(&self) {
        self.tx.close();
    }

    fn on_error(&self, error: FlowError) {
        let _ = self.tx.try_send(StreamItem::Error(error));
        self.tx.close();
    }
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
    /// Subscribes and exposes the join output as a stream of
    /// [`StreamItem`]s. An initial demand of one batch is requested up
    /// front; each consumed value requests one more, so the pipeline runs
    /// exactly as fast as the stream is polled. Dropping the stream cancels
    /// the pipeline.
    pub fn into_stream(self) -> MatchOutputStream<C> {
        let batch_size = self.batch_size();
        let (tx, rx) = async_channel::unbounded();
        let subscription = self.subscribe(Arc::new(ChannelSubscriber { tx }));
        subscription.request(batch_size);
        MatchOutputStream {
            rx: Box::pin(rx),
            subscription,
        }
    }
}

/// Stream adapter over a running match pipeline; see
/// [`MatchWith::into_stream`].
pub struct MatchOutputStream<C> {
    rx: Pin<Box<async_channel::Receiver<StreamItem<C>>>>,
    subscription: MatchSubscription,
}

impl<C: Send + 'static> Stream for MatchOutputStream<C> {
    type Item = StreamItem<C>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.rx.as_mut().poll_next(cx) {
            Poll::Ready(Some(item)) => {
                if item.is_value() {
                    // keep the pipeline one item ahead of the consumer
                    self.subscription.request(1);
                }
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<C> Drop for MatchOutputStream<C> {
    fn drop(&mut self) {
        self.subscription.cancel();
    }
}
