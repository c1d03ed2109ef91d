//! Error types for bridge operations.

use demand_channel::ChannelError;
use thiserror::Error;

/// Errors surfaced by the subscription surface.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// `request` was called with zero demand. Usage error, no state change.
    #[error("demand must be a positive amount")]
    InvalidDemand,

    /// A channel-level error (overflow, source failure, closed).
    #[error(transparent)]
    Channel(#[from] ChannelError),
}
