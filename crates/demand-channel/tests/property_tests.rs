//! Property-based tests for the channel invariants.
//!
//! Coverage:
//! - INV-DC-01: deliveries never exceed cumulative authorized demand
//! - INV-DC-02: a bounded buffer never exceeds its capacity
//! - INV-DC-03: delivery order equals deposit order (FIFO)
//! - INV-DC-04: terminal states are sticky

use demand_channel::{
    ChannelConfig, ChannelState, Demand, DemandChannel, OverflowPolicy,
};
use proptest::prelude::*;

/// One step of an interleaved producer/consumer schedule.
#[derive(Debug, Clone)]
enum Step {
    Deposit(u8),
    Request(u8),
    Drain,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1u8..16).prop_map(Step::Deposit),
        (1u8..16).prop_map(Step::Request),
        Just(Step::Drain),
    ]
}

proptest! {
    /// INV-DC-01: at every point, delivered ≤ sum of requested amounts.
    /// INV-DC-03: items come out in the order they went in.
    #[test]
    fn prop_delivery_bounded_and_fifo(steps in prop::collection::vec(step_strategy(), 0..64)) {
        let ch = DemandChannel::new(ChannelConfig::new(4096, OverflowPolicy::Drop));
        let mut next_item = 0u64;
        let mut requested = 0u64;
        let mut delivered = Vec::new();

        for step in steps {
            match step {
                Step::Deposit(n) => {
                    for _ in 0..n {
                        ch.deposit(next_item).unwrap();
                        next_item += 1;
                    }
                }
                Step::Request(n) => {
                    ch.request_more(Demand::Finite(u64::from(n))).unwrap();
                    requested += u64::from(n);
                }
                Step::Drain => {
                    ch.drain_with(|item| delivered.push(item));
                }
            }
            prop_assert!(delivered.len() as u64 <= requested,
                "INV-DC-01 violated: delivered {} with only {} authorized",
                delivered.len(), requested);
        }

        // Final drain picks up whatever demand remains
        ch.drain_with(|item| delivered.push(item));
        prop_assert!(delivered.len() as u64 <= requested);

        // INV-DC-03: delivered is exactly the prefix 0..k of deposits
        for (i, item) in delivered.iter().enumerate() {
            prop_assert_eq!(*item, i as u64,
                "INV-DC-03 violated: position {} held {}", i, item);
        }
    }

    /// INV-DC-02: bounded buffer never exceeds capacity, whatever the
    /// deposit/drain interleaving, under the DROP policy.
    #[test]
    fn prop_bounded_buffer_drop_policy(
        capacity in 1usize..64,
        steps in prop::collection::vec(step_strategy(), 0..64),
    ) {
        let ch = DemandChannel::new(ChannelConfig::new(capacity, OverflowPolicy::Drop));
        let mut next_item = 0u64;

        for step in steps {
            match step {
                Step::Deposit(n) => {
                    for _ in 0..n {
                        ch.deposit(next_item).unwrap();
                        next_item += 1;
                    }
                }
                Step::Request(n) => {
                    ch.request_more(Demand::Finite(u64::from(n))).unwrap();
                }
                Step::Drain => {
                    ch.drain_with(|_| {});
                }
            }
            prop_assert!(ch.len() <= capacity,
                "INV-DC-02 violated: buffer holds {} with capacity {}",
                ch.len(), capacity);
        }
    }

    /// INV-DC-04: whichever terminal transition lands first wins; later
    /// transitions of any kind are no-ops.
    #[test]
    fn prop_terminal_sticky(first in 0u8..3, later in prop::collection::vec(0u8..3, 0..8)) {
        let ch = DemandChannel::<u64>::new(ChannelConfig::default());

        let transition = |ch: &DemandChannel<u64>, which: u8| match which {
            0 => ch.complete(),
            1 => ch.cancel(),
            _ => ch.fail(demand_channel::ChannelError::Overflow { capacity: 1 }),
        };

        prop_assert!(transition(&ch, first));
        let settled = std::mem::discriminant(&ch.state());

        for which in later {
            prop_assert!(!transition(&ch, which));
            prop_assert_eq!(std::mem::discriminant(&ch.state()), settled);
        }
        prop_assert!(ch.is_terminal());
    }

    /// Requests are cumulative: demand equals requests minus deliveries.
    #[test]
    fn prop_demand_accounting(requests in prop::collection::vec(1u64..32, 0..16), deposits in 0usize..64) {
        let ch = DemandChannel::new(ChannelConfig::new(4096, OverflowPolicy::Error));
        for i in 0..deposits {
            ch.deposit(i as u64).unwrap();
        }

        let mut total = 0u64;
        for n in &requests {
            ch.request_more(Demand::Finite(*n)).unwrap();
            total += n;
        }

        let delivered = ch.drain_with(|_| {}) as u64;
        prop_assert_eq!(delivered, total.min(deposits as u64));
        prop_assert_eq!(ch.outstanding_demand().remaining(), Some(total - delivered));
    }
}

#[test]
fn terminal_state_reflects_first_transition() {
    let ch = DemandChannel::<u64>::new(ChannelConfig::default());
    ch.cancel();
    ch.complete();
    assert!(matches!(ch.state(), ChannelState::Cancelled));
}
