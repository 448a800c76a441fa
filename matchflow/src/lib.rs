// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Key-based join operator for demand-driven asynchronous sequences.
//!
//! Given two independently-produced sequences, key extractors for each and a
//! combiner, [`match_with`] produces one output value per key-equal pair,
//! honoring pull-based backpressure on its output and on both inputs.
//! Unmatched items wait in per-key FIFO queues until a partner arrives from
//! the other side; upstream demand is replenished in lockstep batches so
//! neither source can race arbitrarily far ahead of the other.
//!
//! Sources implement [`matchflow_core::Source`]. Two bridges are provided:
//! [`StreamSource`] adapts any `futures::Stream` of [`StreamItem`]s, and
//! [`SingleSubject`] is a push-style entry point for imperative producers.
//! The output can be consumed through the subscriber protocol or as a
//! `futures::Stream` via [`MatchWith::into_stream`].
//!
//! # Example
//!
//! ```rust
//! use matchflow::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let orders = SingleSubject::new();
//! let shipments = SingleSubject::new();
//!
//! let mut deliveries = match_with(
//!     orders.clone(),
//!     shipments.clone(),
//!     |order: &(u32, &'static str)| Ok(order.0),
//!     |shipment: &(u32, &'static str)| Ok(shipment.0),
//!     |order, shipment| Ok((order.1, shipment.1)),
//!     16,
//! )
//! .into_stream();
//!
//! orders.on_next((1, "books"));
//! shipments.on_next((1, "truck"));
//!
//! use futures::StreamExt;
//! let delivery = deliveries.next().await.unwrap().unwrap();
//! assert_eq!(delivery, ("books", "truck"));
//! # }
//! ```

mod logging;
pub mod match_with;
pub mod prelude;
pub mod single_subject;
pub mod stream_source;

pub use self::match_with::{match_with, MatchOutputStream, MatchSubscription, MatchWith};
pub use self::single_subject::SingleSubject;
pub use self::stream_source::StreamSource;
