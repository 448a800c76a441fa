// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Protocol traits and shared types for demand-driven key matching.
//!
//! This crate defines the vocabulary the rest of the workspace is built on:
//! the [`Subscriber`]/[`Subscription`] pull protocol, the [`Source`] seam
//! that producers implement, the [`StreamItem`] in-band item currency for
//! `futures::Stream` sources, the [`FlowError`] taxonomy, and the atomic
//! [`demand`] bookkeeping with its explicit unbounded sentinel.
//!
//! It deliberately has no async-runtime dependency; runtime-bound pieces
//! (task-backed sources, stream bridges) live in the `matchflow` crate.

pub mod demand;
pub mod error;
pub mod side;
pub mod source;
pub mod stream_item;
pub mod subscriber;

pub use self::error::{BoxError, FlowError, Result};
pub use self::side::Side;
pub use self::source::Source;
pub use self::stream_item::StreamItem;
pub use self::subscriber::{Subscriber, Subscription};
