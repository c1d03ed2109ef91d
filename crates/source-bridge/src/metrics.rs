//! Thread-safe per-subscription counters (uses atomics).

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters recorded by the delivery worker and the deposit path.
#[derive(Debug, Default)]
pub struct BridgeMetrics {
    items_delivered: AtomicU64,
    items_dropped: AtomicU64,
    requests: AtomicU64,
    polls: AtomicU64,
}

impl BridgeMetrics {
    pub(crate) fn record_delivered(&self, count: u64) {
        self.items_delivered.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.items_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_poll(&self) {
        self.polls.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_delivered: self.items_delivered.load(Ordering::Relaxed),
            items_dropped: self.items_dropped.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            polls: self.polls.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a subscription's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Items handed to the subscriber.
    pub items_delivered: u64,
    /// Items shed by the channel's `Drop` overflow policy.
    pub items_dropped: u64,
    /// `request` calls that reached the worker.
    pub requests: u64,
    /// `poll_up_to` calls issued to a pull source.
    pub polls: u64,
}
