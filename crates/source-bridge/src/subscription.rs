//! Consumer-facing subscription handle.

use crate::error::BridgeError;
use crate::metrics::{BridgeMetrics, MetricsSnapshot};
use demand_channel::{Demand, DemandChannel};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

/// Handle to one bridge subscription.
///
/// `request` and `cancel` may be called from any thread. Dropping the handle
/// cancels a still-active subscription so the delivery worker never leaks;
/// call [`join`](Self::join) instead to wait for the natural end.
pub struct Subscription<T> {
    channel: Arc<DemandChannel<T>>,
    ready: Arc<Notify>,
    commands: mpsc::UnboundedSender<Demand>,
    worker: Option<JoinHandle<()>>,
    metrics: Arc<BridgeMetrics>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        channel: Arc<DemandChannel<T>>,
        ready: Arc<Notify>,
        commands: mpsc::UnboundedSender<Demand>,
        worker: JoinHandle<()>,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        Self {
            channel,
            ready,
            commands,
            worker: Some(worker),
            metrics,
        }
    }

    /// Authorizes delivery of `n` more items.
    ///
    /// Demand is cumulative. Requesting zero is a usage error; requesting on
    /// an already-terminated subscription is a no-op.
    pub fn request(&self, n: u64) -> Result<(), BridgeError> {
        if n == 0 {
            return Err(BridgeError::InvalidDemand);
        }
        // A closed command channel means the worker already terminated
        let _ = self.commands.send(Demand::Finite(n));
        Ok(())
    }

    /// Switches the subscription to unbounded delivery.
    pub fn request_unbounded(&self) {
        let _ = self.commands.send(Demand::Unbounded);
    }

    /// Cancels the subscription.
    ///
    /// Takes effect before any subsequently deposited item is delivered.
    /// Idempotent; a cancel after completion or failure is a no-op. Cleanup
    /// (cancel hook, dispose hook, source release) runs on the delivery
    /// worker — await [`join`](Self::join) to observe its completion.
    pub fn cancel(&self) {
        self.channel.cancel();
        self.ready.notify_one();
    }

    /// Returns `true` once the subscription reached a terminal state.
    pub fn is_terminated(&self) -> bool {
        self.channel.is_terminal()
    }

    /// Returns a snapshot of the subscription's counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Waits for the delivery worker to finish its terminal sequence.
    ///
    /// Resolves after the lifecycle hooks have run and the source has been
    /// released — for a cancelled subscription this is the
    /// cancellation-complete signal.
    pub async fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        // A dropped handle can never request or cancel again; cancel a
        // still-active subscription so the worker task winds down.
        if self.worker.is_some() && !self.channel.is_terminal() {
            self.channel.cancel();
            self.ready.notify_one();
        }
    }
}
