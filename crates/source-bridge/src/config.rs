//! Configuration for bridge subscriptions.

use demand_channel::ChannelConfig;

/// Configuration for a bridge subscription.
#[derive(Debug, Clone, Copy)]
pub struct BridgeConfig {
    /// Buffer capacity and overflow policy of the owned demand channel.
    pub channel: ChannelConfig,
    /// Demand auto-requested at subscribe time. `0` leaves the subscription
    /// fully pull-driven: nothing flows until the consumer calls `request`.
    pub initial_demand: u64,
}

impl BridgeConfig {
    /// Creates a configuration from channel settings with no initial demand.
    pub const fn new(channel: ChannelConfig) -> Self {
        Self {
            channel,
            initial_demand: 0,
        }
    }

    /// Sets the demand auto-requested at subscribe time.
    pub fn with_initial_demand(mut self, demand: u64) -> Self {
        self.initial_demand = demand;
        self
    }

    /// Sets the channel configuration.
    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.channel = channel;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new(ChannelConfig::default())
    }
}
