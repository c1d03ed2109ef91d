//! Bridge construction and the per-subscription delivery worker.

use crate::config::BridgeConfig;
use crate::invariants::{
    debug_assert_cancel_path, debug_assert_dispose_fired, debug_assert_source_released,
};
use crate::metrics::BridgeMetrics;
use crate::source::{PullSource, PushHandle, PushSource};
use crate::subscriber::Subscriber;
use crate::subscription::Subscription;
use demand_channel::{ChannelError, ChannelState, Demand, DemandChannel, Deposit};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

/// Cap on a single `poll_up_to` call when the consumer demand is unbounded.
const PULL_BATCH: usize = 64;

type Hook = Box<dyn FnOnce() + Send>;

/// Builds a subscription over a push- or pull-shaped source.
///
/// The builder owns the subscription's lifecycle hooks: `on_cancel` fires
/// only when the consumer cancels, `on_dispose` fires on every terminal
/// path, each at most once, in that order, before the source is released.
///
/// # Example
///
/// ```ignore
/// let subscription = BridgeBuilder::new(BridgeConfig::default())
///     .on_dispose(|| println!("cleaned up"))
///     .subscribe_pull(source, subscriber);
/// subscription.request(10)?;
/// ```
pub struct BridgeBuilder {
    config: BridgeConfig,
    on_cancel: Option<Hook>,
    on_dispose: Option<Hook>,
}

impl BridgeBuilder {
    /// Creates a builder with the given configuration.
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            on_cancel: None,
            on_dispose: None,
        }
    }

    /// Registers a hook invoked when the consumer cancels, before the
    /// dispose hook. Not invoked on completion or failure.
    pub fn on_cancel<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_cancel = Some(Box::new(hook));
        self
    }

    /// Registers a hook invoked on every terminal path, after the cancel
    /// hook (when both apply) and before the source is released.
    pub fn on_dispose<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_dispose = Some(Box::new(hook));
        self
    }

    /// Subscribes to a pull-shaped source.
    ///
    /// The source is polled only in response to consumer demand, with
    /// exactly the newly authorized amount. Must be called within a tokio
    /// runtime: each subscription spawns one delivery worker task whose
    /// join point is [`Subscription::join`].
    pub fn subscribe_pull<T, S, C>(self, source: S, subscriber: C) -> Subscription<T>
    where
        T: Send + 'static,
        S: PullSource<T> + 'static,
        C: Subscriber<T> + 'static,
    {
        let channel = Arc::new(DemandChannel::new(self.config.channel));
        let ready = Arc::new(Notify::new());
        let metrics = Arc::new(BridgeMetrics::default());
        self.spawn(
            channel,
            ready,
            metrics,
            SourceKind::Pull(Box::new(source)),
            Box::new(subscriber),
        )
    }

    /// Subscribes to a push-shaped source.
    ///
    /// The source receives a [`PushHandle`] before the worker starts and may
    /// feed it from any thread. Demand does not slow the source down; the
    /// configured overflow policy bounds memory instead. Must be called
    /// within a tokio runtime.
    pub fn subscribe_push<T, S, C>(self, mut source: S, subscriber: C) -> Subscription<T>
    where
        T: Send + 'static,
        S: PushSource<T> + 'static,
        C: Subscriber<T> + 'static,
    {
        let channel = Arc::new(DemandChannel::new(self.config.channel));
        let ready = Arc::new(Notify::new());
        let metrics = Arc::new(BridgeMetrics::default());
        source.register(PushHandle::new(
            Arc::clone(&channel),
            Arc::clone(&ready),
            Arc::clone(&metrics),
        ));
        self.spawn(
            channel,
            ready,
            metrics,
            SourceKind::Push(Box::new(source)),
            Box::new(subscriber),
        )
    }

    fn spawn<T>(
        self,
        channel: Arc<DemandChannel<T>>,
        ready: Arc<Notify>,
        metrics: Arc<BridgeMetrics>,
        source: SourceKind<T>,
        subscriber: Box<dyn Subscriber<T>>,
    ) -> Subscription<T>
    where
        T: Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let worker = Worker {
            channel: Arc::clone(&channel),
            ready: Arc::clone(&ready),
            commands: command_rx,
            commands_open: true,
            source,
            subscriber,
            on_cancel: self.on_cancel,
            on_dispose: self.on_dispose,
            metrics: Arc::clone(&metrics),
        };
        let handle = tokio::spawn(worker.run(self.config.initial_demand));

        Subscription::new(channel, ready, command_tx, handle, metrics)
    }
}

/// The two source shapes, unified for the worker.
enum SourceKind<T> {
    Pull(Box<dyn PullSource<T>>),
    Push(Box<dyn PushSource<T>>),
}

/// Terminal outcome of a subscription, in channel-state order.
enum Terminal {
    Completed,
    Cancelled,
    Failed(ChannelError),
}

/// Per-subscription delivery worker.
///
/// Owns the source and the subscriber; loops delivering buffered items
/// under demand, reacting to demand commands and to producer wake-ups,
/// until the channel reaches a terminal state. Runs the hook/release
/// sequence exactly once and exits.
struct Worker<T> {
    channel: Arc<DemandChannel<T>>,
    ready: Arc<Notify>,
    commands: mpsc::UnboundedReceiver<Demand>,
    commands_open: bool,
    source: SourceKind<T>,
    subscriber: Box<dyn Subscriber<T>>,
    on_cancel: Option<Hook>,
    on_dispose: Option<Hook>,
    metrics: Arc<BridgeMetrics>,
}

impl<T: Send + 'static> Worker<T> {
    async fn run(mut self, initial_demand: u64) {
        if initial_demand > 0 {
            self.handle_request(Demand::Finite(initial_demand));
        }

        loop {
            self.deliver();

            if let Some(terminal) = self.terminal_reason() {
                self.finish(terminal);
                return;
            }

            tokio::select! {
                command = self.commands.recv(), if self.commands_open => {
                    match command {
                        Some(amount) => self.handle_request(amount),
                        None => self.commands_open = false,
                    }
                }
                () = self.ready.notified() => {}
            }
        }
    }

    /// Hands buffered items to the subscriber, up to outstanding demand.
    fn deliver(&mut self) {
        let subscriber = &mut self.subscriber;
        let delivered = self.channel.drain_with(|item| subscriber.on_item(item));
        if delivered > 0 {
            self.metrics.record_delivered(delivered as u64);
        }
    }

    /// Applies newly authorized demand and, for a pull source, drives it.
    ///
    /// The source is polled with exactly the newly authorized amount (not
    /// the cumulative total). A short non-empty batch is re-polled with the
    /// remainder of this authorization; an empty batch marks the source
    /// exhausted and completes the channel. Between requests the source is
    /// never polled.
    fn handle_request(&mut self, amount: Demand) {
        if self.channel.request_more(amount).is_err() {
            // Zero demand is rejected at the subscription surface already
            return;
        }
        self.metrics.record_request();

        let SourceKind::Pull(source) = &mut self.source else {
            // Push shape: demand is advisory, the run loop drains
            return;
        };

        let mut budget = amount.remaining();
        loop {
            if self.channel.is_terminal() {
                break;
            }
            let want = budget
                .map_or(PULL_BATCH, |remaining| remaining.min(PULL_BATCH as u64) as usize);
            if want == 0 {
                break;
            }

            let batch = match source.poll_up_to(want) {
                Ok(batch) => batch,
                Err(error) => {
                    self.channel.fail(ChannelError::Source(error));
                    break;
                }
            };
            self.metrics.record_poll();

            if batch.is_empty() {
                // End of data
                self.channel.complete();
                break;
            }

            let pulled = batch.len() as u64;
            let subscriber = &mut self.subscriber;
            for item in batch {
                match self.channel.deposit(item) {
                    Ok(Deposit::Accepted) => {}
                    Ok(Deposit::Dropped) => {
                        self.metrics.record_dropped();
                        continue;
                    }
                    Err(_) => break,
                }
                // Deliver as we go so a small buffer cannot overflow on
                // items the consumer already asked for
                let delivered = self.channel.drain_with(|item| subscriber.on_item(item));
                if delivered > 0 {
                    self.metrics.record_delivered(delivered as u64);
                }
            }

            if let Some(remaining) = &mut budget {
                *remaining = remaining.saturating_sub(pulled);
                if *remaining == 0 {
                    break;
                }
            }
        }
    }

    fn terminal_reason(&self) -> Option<Terminal> {
        match self.channel.state() {
            ChannelState::Completed => Some(Terminal::Completed),
            ChannelState::Cancelled => Some(Terminal::Cancelled),
            ChannelState::Failed(error) => Some(Terminal::Failed(error)),
            ChannelState::Active | ChannelState::Completing => None,
        }
    }

    /// Runs the terminal sequence exactly once:
    /// cancel hook (cancelled path only) → dispose hook → source release →
    /// terminal notification (none when cancelled).
    fn finish(&mut self, terminal: Terminal) {
        let cancelled = matches!(terminal, Terminal::Cancelled);
        let had_cancel_hook = self.on_cancel.is_some();

        if cancelled {
            if let Some(hook) = self.on_cancel.take() {
                hook();
            }
        }
        if let Some(hook) = self.on_dispose.take() {
            hook();
        }
        debug_assert_cancel_path!(cancelled, self.on_cancel.is_none(), had_cancel_hook);
        debug_assert_dispose_fired!(self.on_dispose.is_none());

        match &mut self.source {
            SourceKind::Pull(source) => {
                if cancelled {
                    source.cancel();
                }
                source.close();
            }
            SourceKind::Push(source) => source.close(),
        }
        debug_assert_source_released!(true);

        match terminal {
            Terminal::Completed => self.subscriber.on_complete(),
            Terminal::Failed(error) => self.subscriber.on_error(error),
            Terminal::Cancelled => {}
        }
    }
}
