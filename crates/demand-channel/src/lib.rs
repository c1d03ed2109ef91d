//! Demand-driven bounded channel primitive.
//!
//! A [`DemandChannel`] holds a FIFO of produced items, a saturating
//! outstanding-demand counter, and a sticky terminal state. Producers
//! [`deposit`](DemandChannel::deposit) items subject to a configurable
//! [`OverflowPolicy`]; consumers authorize delivery with
//! [`request_more`](DemandChannel::request_more) and take items with
//! [`drain_with`](DemandChannel::drain_with). Deliveries never exceed
//! cumulative authorized demand, and item order is always deposit order.
//!
//! The channel is synchronous and runtime-free: one mutex linearizes every
//! operation, and a condvar implements the `Block` overflow policy. Async
//! waking belongs to the layer above (see the `source-bridge` crate).
//!
//! # Example
//!
//! ```
//! use demand_channel::{ChannelConfig, Demand, DemandChannel, OverflowPolicy};
//!
//! let ch = DemandChannel::new(ChannelConfig::new(8, OverflowPolicy::Error));
//! ch.deposit("a").unwrap();
//! ch.deposit("b").unwrap();
//!
//! // Nothing is delivered until the consumer asks for it
//! ch.request_more(Demand::Finite(1)).unwrap();
//! let mut out = Vec::new();
//! ch.drain_with(|item| out.push(item));
//! assert_eq!(out, vec!["a"]);
//! ```

mod channel;
mod config;
mod demand;
mod error;
mod invariants;

pub use channel::{ChannelState, DemandChannel, Deposit};
pub use config::{ChannelConfig, OverflowPolicy};
pub use demand::Demand;
pub use error::{ChannelError, SourceError};
