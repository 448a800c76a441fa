// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Convenience re-exports for typical pipeline construction.

pub use matchflow_core::{demand, FlowError, Side, Source, StreamItem, Subscriber, Subscription};

pub use crate::match_with::{match_with, MatchOutputStream, MatchSubscription, MatchWith};
pub use crate::single_subject::SingleSubject;
pub use crate::stream_source::StreamSource;
