// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error types for the matchflow workspace.
//!
//! All failure modes of a match pipeline collapse into [`FlowError`]: a
//! failing upstream (tagged with the [`Side`] it came from), a failing key
//! extractor, a failing combiner, or a generic source error raised by
//! channel and bridge code. Every one of them terminates the sequence; the
//! taxonomy exists so the consumer can tell where the failure originated,
//! not so it can recover.

use crate::side::Side;

/// Boxed error type used for user-supplied failure causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Root error type for all matchflow operations.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// An upstream sequence signalled an error.
    #[error("upstream {side} failed: {source}")]
    Upstream {
        /// Which input sequence failed.
        side: Side,
        /// The upstream's error.
        #[source]
        source: BoxError,
    },

    /// A key extractor returned an error.
    #[error("key extraction failed: {source}")]
    KeyExtraction {
        /// The extractor's error.
        #[source]
        source: BoxError,
    },

    /// The combiner returned an error while pairing a matched couple.
    #[error("combiner failed: {source}")]
    Combine {
        /// The combiner's error.
        #[source]
        source: BoxError,
    },

    /// A source, channel or bridge failed outside the match machinery.
    #[error("source error: {context}")]
    Source {
        /// Description of what went wrong.
        context: String,
    },
}

impl FlowError {
    /// Wraps an upstream failure, tagging it with the side it came from.
    pub fn upstream(side: Side, source: impl Into<BoxError>) -> Self {
        Self::Upstream {
            side,
            source: source.into(),
        }
    }

    /// Wraps a key extractor failure.
    pub fn key_extraction(source: impl Into<BoxError>) -> Self {
        Self::KeyExtraction {
            source: source.into(),
        }
    }

    /// Wraps a combiner failure.
    pub fn combine(source: impl Into<BoxError>) -> Self {
        Self::Combine {
            source: source.into(),
        }
    }

    /// Creates a generic source error with the given context.
    pub fn source_error(context: impl Into<String>) -> Self {
        Self::Source {
            context: context.into(),
        }
    }

    /// Returns the side an [`FlowError::Upstream`] error originated from.
    #[must_use]
    pub const fn failed_side(&self) -> Option<Side> {
        match self {
            Self::Upstream { side, .. } => Some(*side),
            _ => None,
        }
    }
}

// Boxed causes cannot be cloned; a clone keeps the variant and carries the
// cause as its rendered message instead.
impl Clone for FlowError {
    fn clone(&self) -> Self {
        match self {
            Self::Upstream { side, source } => Self::Upstream {
                side: *side,
                source: source.to_string().into(),
            },
            Self::KeyExtraction { source } => Self::KeyExtraction {
                source: source.to_string().into(),
            },
            Self::Combine { source } => Self::Combine {
                source: source.to_string().into(),
            },
            Self::Source { context } => Self::Source {
                context: context.clone(),
            },
        }
    }
}

/// Specialized `Result` type for matchflow operations.
pub type Result<T> = std::result::Result<T, FlowError>;
