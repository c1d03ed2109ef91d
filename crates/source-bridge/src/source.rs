//! The two external source shapes the bridge can drive.

use crate::metrics::BridgeMetrics;
use demand_channel::{ChannelError, DemandChannel, Deposit, SourceError};
use std::sync::Arc;
use tokio::sync::Notify;

/// A pull-shaped source: the bridge asks it for up to `n` items at a time.
///
/// `poll_up_to` is synchronous and returns at most `n` items. An empty batch
/// means the source is exhausted; the bridge completes the subscription. The
/// bridge never calls `poll_up_to` for more items than the consumer has
/// authorized, and never between requests.
pub trait PullSource<T>: Send {
    /// Returns up to `n` items, or the failure that ends the subscription.
    fn poll_up_to(&mut self, n: usize) -> Result<Vec<T>, SourceError>;

    /// Called once when the consumer cancels, before `close`.
    fn cancel(&mut self) {}

    /// Called exactly once when the subscription terminates, whatever the
    /// path.
    fn close(&mut self) {}
}

/// A push-shaped source: it decides on its own when items arrive.
///
/// At subscribe time the bridge hands the source a [`PushHandle`]; the
/// source feeds items and terminal signals through it, from any thread.
/// Demand is advisory for this shape — it does not slow the source down —
/// so the channel's overflow policy is what bounds memory.
pub trait PushSource<T>: Send {
    /// Registers the bridge's deposit handle with the source.
    fn register(&mut self, handle: PushHandle<T>);

    /// Called exactly once when the subscription terminates.
    fn close(&mut self) {}
}

/// Deposit handle given to a push-shaped source.
///
/// Explicit per-subscription state rather than a captured closure: the
/// handle owns references to the subscription's channel and its wake signal,
/// nothing else. Cloneable and `Send`; every method tolerates a terminated
/// subscription by silently dropping the call.
pub struct PushHandle<T> {
    channel: Arc<DemandChannel<T>>,
    ready: Arc<Notify>,
    metrics: Arc<BridgeMetrics>,
}

impl<T> PushHandle<T> {
    pub(crate) fn new(
        channel: Arc<DemandChannel<T>>,
        ready: Arc<Notify>,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        Self {
            channel,
            ready,
            metrics,
        }
    }

    /// Deposits one item. Obeys the channel's overflow policy, which may
    /// suspend the calling thread under `Block`. Late items after a terminal
    /// state are dropped.
    pub fn on_item(&self, item: T) {
        if let Ok(Deposit::Dropped) = self.channel.deposit(item) {
            self.metrics.record_dropped();
        }
        self.ready.notify_one();
    }

    /// Deposits a batch of items in order.
    pub fn on_items<I>(&self, batch: I)
    where
        I: IntoIterator<Item = T>,
    {
        for item in batch {
            match self.channel.deposit(item) {
                Ok(Deposit::Accepted) => {}
                Ok(Deposit::Dropped) => self.metrics.record_dropped(),
                Err(_) if self.channel.is_terminal() => break,
                Err(_) => {}
            }
        }
        self.ready.notify_one();
    }

    /// Signals end-of-data. Remaining buffered items are still delivered
    /// under demand before the subscription completes.
    pub fn on_complete(&self) {
        self.channel.complete();
        self.ready.notify_one();
    }

    /// Reports a source failure, which terminates the subscription.
    pub fn on_error(&self, error: SourceError) {
        self.channel.fail(ChannelError::Source(error));
        self.ready.notify_one();
    }

    /// Returns `true` once the subscription has terminated; the source is
    /// expected to stop producing when it observes this.
    pub fn is_terminated(&self) -> bool {
        self.channel.is_terminal()
    }
}

impl<T> Clone for PushHandle<T> {
    fn clone(&self) -> Self {
        Self {
            channel: Arc::clone(&self.channel),
            ready: Arc::clone(&self.ready),
            metrics: Arc::clone(&self.metrics),
        }
    }
}
