//! Consumer-facing callbacks.

use demand_channel::ChannelError;

/// Receives items and exactly one terminal notification.
///
/// Unless the consumer cancels first, either `on_complete` or `on_error` is
/// invoked exactly once, after all item deliveries; a cancelled subscription
/// receives neither. Callbacks run on the subscription's delivery worker.
pub trait Subscriber<T>: Send {
    /// An item was delivered against previously requested demand.
    fn on_item(&mut self, item: T);

    /// The subscription failed. Always the last callback.
    fn on_error(&mut self, error: ChannelError);

    /// The source completed and every buffered item was delivered. Always
    /// the last callback.
    fn on_complete(&mut self);
}

/// Builds a [`Subscriber`] from three closures.
pub fn subscriber<T, I, E, C>(on_item: I, on_error: E, on_complete: C) -> impl Subscriber<T>
where
    I: FnMut(T) + Send,
    E: FnOnce(ChannelError) + Send,
    C: FnOnce() + Send,
{
    CallbackSubscriber {
        on_item,
        on_error: Some(on_error),
        on_complete: Some(on_complete),
    }
}

struct CallbackSubscriber<I, E, C> {
    on_item: I,
    on_error: Option<E>,
    on_complete: Option<C>,
}

impl<T, I, E, C> Subscriber<T> for CallbackSubscriber<I, E, C>
where
    I: FnMut(T) + Send,
    E: FnOnce(ChannelError) + Send,
    C: FnOnce() + Send,
{
    fn on_item(&mut self, item: T) {
        (self.on_item)(item);
    }

    fn on_error(&mut self, error: ChannelError) {
        if let Some(callback) = self.on_error.take() {
            callback(error);
        }
    }

    fn on_complete(&mut self) {
        if let Some(callback) = self.on_complete.take() {
            callback();
        }
    }
}
