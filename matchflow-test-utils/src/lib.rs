// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for the matchflow workspace.
//!
//! For use in tests only, not in production code. Three building blocks:
//!
//! - [`test_channel`]: an unbounded channel whose receiving half is a
//!   `futures::Stream` of [`matchflow_core::StreamItem`]s, for imperative
//!   test setup of stream-backed sources.
//! - [`RecordingSubscriber`]: a subscriber that records every notification
//!   it receives and offers awaitable assertions over them.
//! - [`fixtures`]: small domain types (orders, shipments, deliveries) for
//!   join scenarios that read as more than bare integers.
//!
//! # Example
//!
//! ```rust
//! use matchflow_test_utils::fixtures::{order, shipment, Delivery};
//!
//! let o = order(7, "alice");
//! let s = shipment(7, "truck");
//! let d = Delivery::from_parts(o, s);
//! assert_eq!(d.customer, "alice");
//! ```

pub mod fixtures;
pub mod helpers;
pub mod recording;
pub mod test_channel;

pub use self::helpers::assert_no_element_emitted;
pub use self::recording::RecordingSubscriber;
pub use self::test_channel::{test_channel, TestSender};
