//! Integration tests for the demand channel, covering the overflow-policy
//! scenarios and terminal-state behavior end to end.

use demand_channel::{
    ChannelConfig, ChannelError, ChannelState, Demand, DemandChannel, Deposit, OverflowPolicy,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_error_policy_capacity_two_scenario() {
    // Capacity 2, policy ERROR, three deposits, no demand issued:
    // first two succeed, third overflows and fails the channel.
    let ch = DemandChannel::new(ChannelConfig::new(2, OverflowPolicy::Error));

    assert_eq!(ch.deposit("x").unwrap(), Deposit::Accepted);
    assert_eq!(ch.deposit("y").unwrap(), Deposit::Accepted);
    assert!(matches!(
        ch.deposit("z"),
        Err(ChannelError::Overflow { capacity: 2 })
    ));
    assert!(matches!(ch.state(), ChannelState::Failed(_)));
    assert!(matches!(
        ch.terminal_error(),
        Some(ChannelError::Overflow { capacity: 2 })
    ));
}

#[test]
fn test_block_policy_suspends_until_drain() {
    let ch = Arc::new(DemandChannel::new(ChannelConfig::new(
        1,
        OverflowPolicy::Block,
    )));
    ch.deposit(1u64).unwrap();

    let producer = {
        let ch = Arc::clone(&ch);
        thread::spawn(move || ch.deposit(2))
    };

    // Give the producer time to park on the full buffer
    thread::sleep(Duration::from_millis(50));
    assert_eq!(ch.len(), 1);

    // Draining one item frees space; the blocked deposit must then succeed
    ch.request_more(Demand::Finite(1)).unwrap();
    let mut out = Vec::new();
    ch.drain_with(|item| out.push(item));
    assert_eq!(out, vec![1]);

    let result = producer.join().expect("producer thread panicked");
    assert_eq!(result.unwrap(), Deposit::Accepted);
    assert_eq!(ch.len(), 1);
}

#[test]
fn test_block_policy_deposit_fails_after_cancel() {
    let ch = Arc::new(DemandChannel::new(ChannelConfig::new(
        1,
        OverflowPolicy::Block,
    )));
    ch.deposit(1u64).unwrap();

    let producer = {
        let ch = Arc::clone(&ch);
        thread::spawn(move || ch.deposit(2))
    };

    thread::sleep(Duration::from_millis(50));
    ch.cancel();

    // The suspended deposit must observe the cancellation, not succeed
    let result = producer.join().expect("producer thread panicked");
    assert!(matches!(result, Err(ChannelError::Cancelled)));
}

#[test]
fn test_concurrent_deposit_and_request() {
    let ch = Arc::new(DemandChannel::new(ChannelConfig::new(
        1024,
        OverflowPolicy::Block,
    )));
    const ITEMS: u64 = 10_000;

    let producer = {
        let ch = Arc::clone(&ch);
        thread::spawn(move || {
            for i in 0..ITEMS {
                ch.deposit(i).unwrap();
            }
            ch.complete();
        })
    };

    // Consumer requests in small increments from another thread
    let mut received = Vec::new();
    let mut authorized: u64 = 0;
    while !matches!(ch.state(), ChannelState::Completed) {
        if authorized == received.len() as u64 {
            ch.request_more(Demand::Finite(100)).unwrap();
            authorized += 100;
        }
        ch.drain_with(|item| received.push(item));
    }

    producer.join().expect("producer thread panicked");
    assert_eq!(received.len() as u64, ITEMS);
    // FIFO: delivery order equals deposit order
    assert!(received.windows(2).all(|w| w[0] + 1 == w[1]));
}

#[test]
fn test_unbounded_demand_drains_everything() {
    let ch = DemandChannel::new(ChannelConfig::default());
    for i in 0..100 {
        ch.deposit(i).unwrap();
    }
    ch.request_more(Demand::Unbounded).unwrap();
    assert_eq!(ch.drain_with(|_| {}), 100);
    assert!(ch.outstanding_demand().is_unbounded());
}

#[test]
fn test_double_cancel_is_idempotent() {
    let ch = DemandChannel::<u32>::new(ChannelConfig::default());
    assert!(ch.cancel());
    assert!(!ch.cancel());
    assert!(matches!(ch.state(), ChannelState::Cancelled));
}

#[test]
fn test_fail_is_sticky_over_complete() {
    let ch = DemandChannel::<u32>::new(ChannelConfig::default());
    let err = ChannelError::Source(demand_channel::SourceError::msg("boom"));
    assert!(ch.fail(err));
    assert!(!ch.complete());
    assert!(matches!(ch.state(), ChannelState::Failed(_)));
    assert!(matches!(
        ch.terminal_error(),
        Some(ChannelError::Source(_))
    ));
}
