//! Demand-driven bridge between external sources and a backpressured
//! consumer.
//!
//! This crate adapts two shapes of external, non-reactive source onto a
//! [`demand_channel::DemandChannel`]:
//!
//! - **Pull shape** ([`PullSource`]): the bridge asks for up to `n` items,
//!   driven strictly by consumer demand.
//! - **Push shape** ([`PushSource`]): the source produces on its own
//!   schedule through a [`PushHandle`]; the channel's overflow policy
//!   bounds memory.
//!
//! Each subscription owns its channel, spawns one delivery worker task, and
//! guarantees the lifecycle sequence on every termination path: cancel hook
//! (cancellation only) → dispose hook → source release, each at most once,
//! followed by exactly one terminal notification to the subscriber (none
//! when the consumer cancelled).
//!
//! # Example
//!
//! ```ignore
//! use source_bridge::{subscriber, BridgeBuilder, BridgeConfig};
//!
//! let subscription = BridgeBuilder::new(BridgeConfig::default())
//!     .on_dispose(|| println!("released"))
//!     .subscribe_pull(
//!         lines,
//!         subscriber(
//!             |line| println!("got {line}"),
//!             |err| eprintln!("failed: {err}"),
//!             || println!("done"),
//!         ),
//!     );
//!
//! subscription.request(10)?;
//! subscription.join().await;
//! ```

mod bridge;
mod config;
mod error;
mod invariants;
mod metrics;
mod source;
mod subscriber;
mod subscription;

pub use bridge::BridgeBuilder;
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use metrics::{BridgeMetrics, MetricsSnapshot};
pub use source::{PullSource, PushHandle, PushSource};
pub use subscriber::{subscriber, Subscriber};
pub use subscription::Subscription;

// Re-export the channel vocabulary used across the API surface
pub use demand_channel::{
    ChannelConfig, ChannelError, ChannelState, Demand, DemandChannel, Deposit, OverflowPolicy,
    SourceError,
};
