//! The demand channel: a bounded FIFO with explicit consumer demand.

use crate::invariants::{
    debug_assert_buffer_bounded, debug_assert_delivery_bounded, debug_assert_terminal_sticky,
};
use crate::{ChannelConfig, ChannelError, Demand, OverflowPolicy};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Lifecycle state of a [`DemandChannel`].
///
/// `Completed`, `Cancelled`, and `Failed` are terminal and sticky: once
/// entered they never change. `Completing` marks a channel whose producer has
/// signalled end-of-data while buffered items remain undelivered; it drains
/// to `Completed` once the consumer takes the rest.
#[derive(Debug, Clone)]
pub enum ChannelState {
    /// Accepting deposits and deliveries.
    Active,
    /// End-of-data signalled; buffered items still awaiting delivery.
    Completing,
    /// All items delivered, end-of-data reached.
    Completed,
    /// Cancelled by the consumer. Undelivered items are discarded.
    Cancelled,
    /// Failed with the recorded error. Undelivered items are discarded.
    Failed(ChannelError),
}

impl ChannelState {
    /// Returns `true` for the sticky terminal states.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed(_))
    }

    /// Returns `true` while items may still be delivered to the consumer.
    #[inline]
    fn allows_delivery(&self) -> bool {
        matches!(self, Self::Active | Self::Completing)
    }

    /// Maps a non-deliverable state to the error a producer should see.
    fn deposit_error(&self) -> ChannelError {
        match self {
            Self::Cancelled => ChannelError::Cancelled,
            Self::Failed(err) => err.clone(),
            _ => ChannelError::Closed,
        }
    }
}

/// Outcome of a successful deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deposit {
    /// The item was buffered for delivery.
    Accepted,
    /// The item was discarded under [`OverflowPolicy::Drop`].
    Dropped,
}

struct ChannelInner<T> {
    buffer: VecDeque<T>,
    demand: Demand,
    state: ChannelState,
    /// Cumulative counters for invariant checks (debug only).
    #[cfg(debug_assertions)]
    requested_total: u64,
    #[cfg(debug_assertions)]
    delivered_total: u64,
    #[cfg(debug_assertions)]
    saw_unbounded: bool,
}

/// Bounded FIFO transport primitive with a signed-off demand counter.
///
/// The producer side calls [`deposit`](Self::deposit); the consumer side
/// authorizes delivery with [`request_more`](Self::request_more) and takes
/// items with [`drain_with`](Self::drain_with). A single mutex guards
/// `(buffer, demand, state)` so all operations are linearizable: no item is
/// ever counted against demand and left undelivered, and overflow detection
/// never races a concurrent deposit.
///
/// The channel knows nothing about where items come from; adapting an
/// external source onto it is the job of the `source-bridge` crate.
pub struct DemandChannel<T> {
    inner: Mutex<ChannelInner<T>>,
    /// Wakes producers blocked under [`OverflowPolicy::Block`]. Notified on
    /// drain and on every terminal transition.
    space: Condvar,
    config: ChannelConfig,
}

impl<T> DemandChannel<T> {
    /// Creates a new channel with the given configuration.
    pub fn new(config: ChannelConfig) -> Self {
        let initial = if config.is_bounded() {
            config.capacity.min(64)
        } else {
            64
        };
        Self {
            inner: Mutex::new(ChannelInner {
                buffer: VecDeque::with_capacity(initial),
                demand: Demand::none(),
                state: ChannelState::Active,
                #[cfg(debug_assertions)]
                requested_total: 0,
                #[cfg(debug_assertions)]
                delivered_total: 0,
                #[cfg(debug_assertions)]
                saw_unbounded: false,
            }),
            space: Condvar::new(),
            config,
        }
    }

    /// Recover the guard even if a handler panicked while holding it; the
    /// invariants hold at every release point, so the state is not torn.
    fn lock(&self) -> MutexGuard<'_, ChannelInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deposits an item from the producer side.
    ///
    /// Behavior when the bounded buffer is full depends on the configured
    /// [`OverflowPolicy`]:
    ///
    /// - `Buffer`: never full, always accepted
    /// - `Drop`: item discarded, `Ok(Deposit::Dropped)`
    /// - `Error`: channel fails with [`ChannelError::Overflow`] and the
    ///   error is returned
    /// - `Block`: the calling thread suspends until the consumer drains or
    ///   the channel terminates (then `Cancelled`/`Closed`/the failure)
    ///
    /// After a terminal state this is a no-op returning the matching benign
    /// error ([`ChannelError::Closed`] or [`ChannelError::Cancelled`]).
    pub fn deposit(&self, item: T) -> Result<Deposit, ChannelError> {
        let mut inner = self.lock();
        loop {
            if !matches!(inner.state, ChannelState::Active) {
                return Err(inner.state.deposit_error());
            }

            if !self.config.is_bounded() || inner.buffer.len() < self.config.capacity {
                inner.buffer.push_back(item);
                debug_assert_buffer_bounded!(
                    inner.buffer.len(),
                    self.config.capacity,
                    self.config.is_bounded()
                );
                return Ok(Deposit::Accepted);
            }

            match self.config.policy {
                OverflowPolicy::Buffer => unreachable!("unbounded policy cannot be full"),
                OverflowPolicy::Drop => return Ok(Deposit::Dropped),
                OverflowPolicy::Error => {
                    let err = ChannelError::Overflow {
                        capacity: self.config.capacity,
                    };
                    inner.state = ChannelState::Failed(err.clone());
                    inner.buffer.clear();
                    self.space.notify_all();
                    return Err(err);
                }
                OverflowPolicy::Block => {
                    inner = self
                        .space
                        .wait(inner)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Adds newly authorized demand from the consumer side.
    ///
    /// Demand is cumulative and saturating; [`Demand::Unbounded`] switches
    /// the channel to unbounded delivery permanently. Requesting
    /// `Demand::Finite(0)` is a usage error. After a terminal state this is
    /// a no-op.
    pub fn request_more(&self, amount: Demand) -> Result<(), ChannelError> {
        if matches!(amount, Demand::Finite(0)) {
            return Err(ChannelError::InvalidDemand);
        }
        let mut inner = self.lock();
        if inner.state.is_terminal() {
            return Ok(());
        }
        inner.demand.add(amount);
        #[cfg(debug_assertions)]
        match amount {
            Demand::Finite(n) => inner.requested_total = inner.requested_total.saturating_add(n),
            Demand::Unbounded => inner.saw_unbounded = true,
        }
        Ok(())
    }

    /// Delivers buffered items to `handler` while demand remains.
    ///
    /// Each delivery consumes one unit of demand. The handler runs outside
    /// the channel lock, so it may re-enter (a consumer requesting more
    /// demand from inside the handler is fine). Stops when the buffer is
    /// empty, demand is exhausted, or the state no longer permits delivery;
    /// restartable after further deposits or requests. Returns the number of
    /// items delivered by this call.
    ///
    /// A `Completing` channel transitions to `Completed` here once its
    /// buffer empties.
    pub fn drain_with<F>(&self, mut handler: F) -> usize
    where
        F: FnMut(T),
    {
        let mut delivered = 0;
        loop {
            let item = {
                let mut inner = self.lock();
                if !inner.state.allows_delivery() {
                    break;
                }
                let popped = if inner.demand.has_demand() {
                    inner.buffer.pop_front()
                } else {
                    None
                };
                match popped {
                    Some(item) => {
                        inner.demand.consume_one();
                        #[cfg(debug_assertions)]
                        {
                            inner.delivered_total += 1;
                            debug_assert_delivery_bounded!(
                                inner.delivered_total,
                                inner.requested_total,
                                inner.saw_unbounded
                            );
                        }
                        self.space.notify_all();
                        item
                    }
                    None => {
                        if matches!(inner.state, ChannelState::Completing)
                            && inner.buffer.is_empty()
                        {
                            inner.state = ChannelState::Completed;
                            self.space.notify_all();
                        }
                        break;
                    }
                }
            };
            handler(item);
            delivered += 1;
        }
        delivered
    }

    /// Signals end-of-data from the producer side.
    ///
    /// Enters `Completing` while undelivered items remain, `Completed`
    /// otherwise. Idempotent: returns `false` if the channel was already
    /// completing or terminal.
    pub fn complete(&self) -> bool {
        let mut inner = self.lock();
        if !matches!(inner.state, ChannelState::Active) {
            return false;
        }
        debug_assert_terminal_sticky!(inner.state.is_terminal());
        inner.state = if inner.buffer.is_empty() {
            ChannelState::Completed
        } else {
            ChannelState::Completing
        };
        self.space.notify_all();
        true
    }

    /// Fails the channel with the given error, discarding buffered items.
    ///
    /// Idempotent: a second terminal transition is a no-op.
    pub fn fail(&self, error: ChannelError) -> bool {
        let mut inner = self.lock();
        if inner.state.is_terminal() {
            return false;
        }
        debug_assert_terminal_sticky!(inner.state.is_terminal());
        inner.state = ChannelState::Failed(error);
        inner.buffer.clear();
        self.space.notify_all();
        true
    }

    /// Cancels the channel, discarding buffered items.
    ///
    /// Takes effect before any subsequently deposited item is delivered;
    /// items already handed to the consumer are not retracted. Idempotent.
    pub fn cancel(&self) -> bool {
        let mut inner = self.lock();
        if inner.state.is_terminal() {
            return false;
        }
        debug_assert_terminal_sticky!(inner.state.is_terminal());
        inner.state = ChannelState::Cancelled;
        inner.buffer.clear();
        self.space.notify_all();
        true
    }

    /// Returns a snapshot of the lifecycle state.
    pub fn state(&self) -> ChannelState {
        self.lock().state.clone()
    }

    /// Returns `true` once the channel has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.lock().state.is_terminal()
    }

    /// Returns the error recorded by a failed channel, if any.
    pub fn terminal_error(&self) -> Option<ChannelError> {
        match &self.lock().state {
            ChannelState::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    /// Returns the outstanding (authorized but undelivered) demand.
    pub fn outstanding_demand(&self) -> Demand {
        self.lock().demand
    }

    /// Returns the number of buffered, undelivered items.
    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    /// Returns `true` if no items are buffered.
    pub fn is_empty(&self) -> bool {
        self.lock().buffer.is_empty()
    }

    /// Returns the channel configuration.
    pub fn config(&self) -> ChannelConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(capacity: usize, policy: OverflowPolicy) -> ChannelConfig {
        ChannelConfig::new(capacity, policy)
    }

    #[test]
    fn test_deposit_then_drain_in_order() {
        let ch = DemandChannel::new(config(8, OverflowPolicy::Error));
        ch.deposit(1).unwrap();
        ch.deposit(2).unwrap();
        ch.deposit(3).unwrap();

        ch.request_more(Demand::Finite(2)).unwrap();
        let mut out = Vec::new();
        let n = ch.drain_with(|item| out.push(item));
        assert_eq!(n, 2);
        assert_eq!(out, vec![1, 2]);
        assert_eq!(ch.len(), 1);

        // Restartable once more demand arrives
        ch.request_more(Demand::Finite(5)).unwrap();
        ch.drain_with(|item| out.push(item));
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_no_delivery_without_demand() {
        let ch = DemandChannel::new(config(8, OverflowPolicy::Error));
        ch.deposit("a").unwrap();
        assert_eq!(ch.drain_with(|_| panic!("no demand was authorized")), 0);
    }

    #[test]
    fn test_zero_demand_rejected() {
        let ch = DemandChannel::<u32>::new(ChannelConfig::default());
        assert!(matches!(
            ch.request_more(Demand::Finite(0)),
            Err(ChannelError::InvalidDemand)
        ));
        // No state change
        assert!(matches!(ch.state(), ChannelState::Active));
    }

    #[test]
    fn test_overflow_error_policy_fails_channel() {
        let ch = DemandChannel::new(config(2, OverflowPolicy::Error));
        ch.deposit(1).unwrap();
        ch.deposit(2).unwrap();
        let err = ch.deposit(3).unwrap_err();
        assert!(matches!(err, ChannelError::Overflow { capacity: 2 }));
        assert!(matches!(ch.state(), ChannelState::Failed(_)));
        // Subsequent deposits surface the recorded failure
        assert!(ch.deposit(4).is_err());
    }

    #[test]
    fn test_drop_policy_discards_silently() {
        let ch = DemandChannel::new(config(1, OverflowPolicy::Drop));
        assert_eq!(ch.deposit(1).unwrap(), Deposit::Accepted);
        assert_eq!(ch.deposit(2).unwrap(), Deposit::Dropped);
        assert_eq!(ch.len(), 1);
        assert!(matches!(ch.state(), ChannelState::Active));
    }

    #[test]
    fn test_unbounded_policy_never_overflows() {
        let ch = DemandChannel::new(ChannelConfig::unbounded());
        for i in 0..10_000 {
            ch.deposit(i).unwrap();
        }
        assert_eq!(ch.len(), 10_000);
    }

    #[test]
    fn test_complete_with_buffered_items_parks_in_completing() {
        let ch = DemandChannel::new(config(8, OverflowPolicy::Error));
        ch.deposit(1).unwrap();
        assert!(ch.complete());
        assert!(matches!(ch.state(), ChannelState::Completing));
        assert!(!ch.is_terminal());

        // Remaining item still delivered under demand, then Completed
        ch.request_more(Demand::Finite(1)).unwrap();
        let mut out = Vec::new();
        ch.drain_with(|item| out.push(item));
        assert_eq!(out, vec![1]);
        assert!(matches!(ch.state(), ChannelState::Completed));
    }

    #[test]
    fn test_terminal_states_sticky() {
        let ch = DemandChannel::<u32>::new(ChannelConfig::default());
        assert!(ch.cancel());
        assert!(!ch.cancel());
        assert!(!ch.complete());
        assert!(!ch.fail(ChannelError::Overflow { capacity: 1 }));
        assert!(matches!(ch.state(), ChannelState::Cancelled));
    }

    #[test]
    fn test_deposit_after_terminal_is_benign() {
        let ch = DemandChannel::new(ChannelConfig::default());
        ch.cancel();
        assert!(matches!(ch.deposit(1), Err(ChannelError::Cancelled)));
        ch.request_more(Demand::Finite(1)).unwrap();
        assert_eq!(ch.drain_with(|_: i32| {}), 0);
    }

    #[test]
    fn test_cancel_discards_buffered_items() {
        let ch = DemandChannel::new(config(8, OverflowPolicy::Error));
        ch.deposit(1).unwrap();
        ch.deposit(2).unwrap();
        ch.cancel();
        assert!(ch.is_empty());
        ch.request_more(Demand::Finite(2)).unwrap();
        assert_eq!(ch.drain_with(|_| panic!("cancelled channel delivered")), 0);
    }

    #[test]
    fn test_reentrant_request_from_handler() {
        let ch = std::sync::Arc::new(DemandChannel::new(config(8, OverflowPolicy::Error)));
        for i in 0..3 {
            ch.deposit(i).unwrap();
        }
        // One-at-a-time consumer: request one more from inside the handler
        ch.request_more(Demand::Finite(1)).unwrap();
        let inner = std::sync::Arc::clone(&ch);
        let mut out = Vec::new();
        ch.drain_with(|item| {
            out.push(item);
            inner.request_more(Demand::Finite(1)).unwrap();
        });
        assert_eq!(out, vec![0, 1, 2]);
    }
}
