//! Configuration for the demand channel.

/// What `deposit` does when the bounded buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Grow without bound. The capacity setting is ignored.
    ///
    /// This is the degenerate case: a producer that outruns the consumer can
    /// grow memory without limit. Prefer a bounded policy unless the producer
    /// is known to be finite.
    Buffer,
    /// Silently discard the incoming item and report success.
    Drop,
    /// Fail the channel with an overflow error.
    Error,
    /// Suspend the depositing thread until space frees or the channel
    /// reaches a terminal state.
    Block,
}

/// Configuration for a [`DemandChannel`](crate::DemandChannel).
#[derive(Debug, Clone, Copy)]
pub struct ChannelConfig {
    /// Maximum number of buffered, undelivered items (ignored under
    /// [`OverflowPolicy::Buffer`]).
    pub capacity: usize,
    /// Behavior when the buffer is full.
    pub policy: OverflowPolicy,
}

impl ChannelConfig {
    /// Creates a new configuration with custom settings.
    pub const fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self { capacity, policy }
    }

    /// Unbounded buffering. See the caveat on [`OverflowPolicy::Buffer`].
    pub const fn unbounded() -> Self {
        Self::new(usize::MAX, OverflowPolicy::Buffer)
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the overflow policy.
    pub fn with_policy(mut self, policy: OverflowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns `true` if the configured policy bounds the buffer.
    #[inline]
    pub const fn is_bounded(&self) -> bool {
        !matches!(self.policy, OverflowPolicy::Buffer)
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            policy: OverflowPolicy::Block,
        }
    }
}
