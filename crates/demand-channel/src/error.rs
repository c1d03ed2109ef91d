//! Error types for channel operations.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur on a demand channel.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// A request for zero or negative demand. Usage error, no state change.
    #[error("demand must be a positive amount")]
    InvalidDemand,

    /// The bounded buffer is full and the policy escalates overflow to an
    /// error. The channel transitions to `Failed` when this is raised.
    #[error("buffer capacity {capacity} exceeded")]
    Overflow {
        /// The configured buffer capacity.
        capacity: usize,
    },

    /// Operation attempted after the channel completed or failed. Benign.
    #[error("channel is closed")]
    Closed,

    /// Operation attempted after the channel was cancelled. Benign.
    #[error("channel was cancelled")]
    Cancelled,

    /// The external source reported an error.
    #[error("source failure: {0}")]
    Source(#[from] SourceError),
}

impl ChannelError {
    /// Returns `true` if this error is a benign after-terminal no-op rather
    /// than a failure the consumer should see.
    #[inline]
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }

    /// Returns `true` if this error fails the channel when raised.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Overflow { .. } | Self::Source(_))
    }
}

/// Cloneable wrapper around an arbitrary error reported by an external
/// source. Stored in the channel's `Failed` state and handed to the consumer
/// after disposal, so it must be shareable.
#[derive(Debug, Clone)]
pub struct SourceError {
    inner: Arc<dyn std::error::Error + Send + Sync>,
}

impl SourceError {
    /// Wraps an external error.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(error),
        }
    }

    /// Creates a source error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ChannelError::Closed.is_benign());
        assert!(ChannelError::Cancelled.is_benign());
        assert!(!ChannelError::InvalidDemand.is_benign());
        assert!(ChannelError::Overflow { capacity: 2 }.is_fatal());
        assert!(ChannelError::Source(SourceError::msg("boom")).is_fatal());
    }

    #[test]
    fn test_source_error_display() {
        let err = ChannelError::Source(SourceError::msg("connection reset"));
        assert_eq!(err.to_string(), "source failure: connection reset");
    }
}
