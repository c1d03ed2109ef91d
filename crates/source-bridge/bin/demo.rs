//! Demonstration of source-bridge features.
//!
//! Run with: `cargo run -p source-bridge --bin demo`

use source_bridge::{
    subscriber, BridgeBuilder, BridgeConfig, ChannelConfig, OverflowPolicy, PullSource,
    PushHandle, PushSource, SourceError,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== source-bridge Demo ===\n");

    demo_pull_source().await?;
    demo_push_source().await?;
    demo_overflow_policy().await?;
    demo_cancellation().await?;

    println!("\n=== All demos completed successfully! ===");
    Ok(())
}

/// Pull source over a fixed set of log lines.
struct LogLines {
    lines: Vec<&'static str>,
    cursor: usize,
}

impl PullSource<&'static str> for LogLines {
    fn poll_up_to(&mut self, n: usize) -> Result<Vec<&'static str>, SourceError> {
        let end = (self.cursor + n).min(self.lines.len());
        let batch = self.lines[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(batch)
    }

    fn close(&mut self) {
        println!("  [source] closed at line {}", self.cursor);
    }
}

/// Push source fed from a plain thread through its registered handle.
struct SensorFeed {
    handle_slot: Arc<Mutex<Option<PushHandle<u64>>>>,
}

impl PushSource<u64> for SensorFeed {
    fn register(&mut self, handle: PushHandle<u64>) {
        *self.handle_slot.lock().unwrap() = Some(handle);
    }

    fn close(&mut self) {
        println!("  [source] sensor feed closed");
    }
}

/// Demo 1: Pull source driven strictly by consumer demand
async fn demo_pull_source() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 1: Pull Source ---");

    let source = LogLines {
        lines: vec![
            "2026-08-24T10:00:01 GET /health 200",
            "2026-08-24T10:00:02 GET /orders 200",
            "2026-08-24T10:00:03 POST /orders 201",
            "2026-08-24T10:00:04 GET /orders/17 200",
            "2026-08-24T10:00:05 DELETE /orders/17 204",
        ],
        cursor: 0,
    };

    let subscription = BridgeBuilder::new(BridgeConfig::default()).subscribe_pull(
        source,
        subscriber(
            |line| println!("  Received: {line}"),
            |err| eprintln!("  Failed: {err}"),
            || println!("  Stream complete"),
        ),
    );

    // Demand in two installments; the source is polled for exactly that much
    subscription.request(2)?;
    tokio::time::sleep(Duration::from_millis(20)).await;
    println!("  (requesting the rest)");
    subscription.request(10)?;
    subscription.join().await;

    println!("  ✓ Pull source complete\n");
    Ok(())
}

/// Demo 2: Push source producing on its own schedule
async fn demo_push_source() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 2: Push Source ---");

    let handle_slot = Arc::new(Mutex::new(None));
    let received = Arc::new(AtomicU64::new(0));

    let counter = Arc::clone(&received);
    let subscription = BridgeBuilder::new(BridgeConfig::default()).subscribe_push(
        SensorFeed {
            handle_slot: Arc::clone(&handle_slot),
        },
        subscriber(
            move |reading: u64| {
                counter.fetch_add(1, Ordering::Relaxed);
                if reading % 4 == 0 {
                    println!("  Reading: {reading}");
                }
            },
            |err| eprintln!("  Failed: {err}"),
            || println!("  Feed complete"),
        ),
    );

    subscription.request_unbounded();

    // The producer runs on its own thread, unaware of the consumer
    let handle = handle_slot.lock().unwrap().take().ok_or("not registered")?;
    let producer = std::thread::spawn(move || {
        for reading in 0..16u64 {
            handle.on_item(reading * 100);
            std::thread::sleep(Duration::from_millis(2));
        }
        handle.on_complete();
    });

    subscription.join().await;
    producer.join().map_err(|_| "producer panicked")?;

    println!(
        "  Delivered {} readings",
        received.load(Ordering::Relaxed)
    );
    println!("  ✓ Push source complete\n");
    Ok(())
}

/// Demo 3: Overflow policies bound memory for a fast push producer
async fn demo_overflow_policy() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 3: Overflow Policy (Drop) ---");

    let handle_slot = Arc::new(Mutex::new(None));
    let received = Arc::new(AtomicU64::new(0));

    // Tiny buffer, Drop policy: the producer is never slowed down,
    // overflow is shed instead
    let config = BridgeConfig::new(ChannelConfig::new(4, OverflowPolicy::Drop));
    let counter = Arc::clone(&received);
    let subscription = BridgeBuilder::new(config).subscribe_push(
        SensorFeed {
            handle_slot: Arc::clone(&handle_slot),
        },
        subscriber(
            move |_reading: u64| {
                counter.fetch_add(1, Ordering::Relaxed);
            },
            |err| eprintln!("  Failed: {err}"),
            || println!("  Feed complete"),
        ),
    );

    // Burst 100 items before any demand exists: only 4 fit
    let handle = handle_slot.lock().unwrap().take().ok_or("not registered")?;
    handle.on_items(0..100u64);
    handle.on_complete();

    subscription.request_unbounded();
    subscription.join().await;

    println!(
        "  Burst of 100, buffer of 4: delivered {} (rest shed)",
        received.load(Ordering::Relaxed)
    );
    println!("  ✓ Overflow policy complete\n");
    Ok(())
}

/// Demo 4: Cancellation and the lifecycle hook sequence
async fn demo_cancellation() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- Demo 4: Cancellation ---");

    let source = LogLines {
        lines: vec!["line-1", "line-2", "line-3", "line-4", "line-5"],
        cursor: 0,
    };

    let subscription = BridgeBuilder::new(BridgeConfig::default())
        .on_cancel(|| println!("  [hook] cancelled by consumer"))
        .on_dispose(|| println!("  [hook] resources disposed"))
        .subscribe_pull(
            source,
            subscriber(
                |line| println!("  Received: {line}"),
                |err| eprintln!("  Failed: {err}"),
                || println!("  Stream complete (not expected here)"),
            ),
        );

    subscription.request(2)?;
    tokio::time::sleep(Duration::from_millis(20)).await;

    println!("  Consumer has seen enough, cancelling...");
    subscription.cancel();
    // join() resolves once the hooks have run and the source is released
    subscription.join().await;

    println!("  ✓ Cancellation complete\n");
    Ok(())
}
