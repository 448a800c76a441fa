// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use matchflow_core::{FlowError, Side};

/// One notification from one side of the join, as queued between the source
/// adapters and the drain loop. Consumed exactly once.
pub(crate) enum SourceEvent<A, B> {
    /// A value arrived on side A.
    ItemA(A),
    /// A value arrived on side B.
    ItemB(B),
    /// The given side completed normally.
    Completed(Side),
    /// A side failed; the error is already tagged with its origin.
    Failed(FlowError),
}
