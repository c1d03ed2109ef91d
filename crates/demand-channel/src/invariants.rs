//! Debug assertion macros for channel invariants.
//!
//! Active only in debug builds (`#[cfg(debug_assertions)]`), so there is
//! zero overhead in release builds.

// =============================================================================
// INV-DC-01: Bounded Delivery
// =============================================================================

/// Assert that cumulative deliveries never exceed cumulative authorized demand.
///
/// **Invariant**: `delivered_total ≤ requested_total` (finite demand only)
///
/// Used in: `DemandChannel::drain_with()` after each delivery
macro_rules! debug_assert_delivery_bounded {
    ($delivered:expr, $requested:expr, $unbounded:expr) => {
        debug_assert!(
            $unbounded || $delivered <= $requested,
            "INV-DC-01 violated: delivered {} items but only {} were authorized",
            $delivered,
            $requested
        )
    };
}

// =============================================================================
// INV-DC-02: Bounded Buffer
// =============================================================================

/// Assert that a bounded buffer never exceeds its capacity.
///
/// **Invariant**: `policy bounded → buffer.len() ≤ capacity`
///
/// Used in: `DemandChannel::deposit()` after a successful push
macro_rules! debug_assert_buffer_bounded {
    ($len:expr, $capacity:expr, $bounded:expr) => {
        debug_assert!(
            !$bounded || $len <= $capacity,
            "INV-DC-02 violated: buffer holds {} items, capacity is {}",
            $len,
            $capacity
        )
    };
}

// =============================================================================
// INV-DC-04: Sticky Terminal State
// =============================================================================

/// Assert that a terminal transition never overwrites another terminal state.
///
/// **Invariant**: `state ∈ {Completed, Cancelled, Failed} → state never changes`
///
/// Used in: `complete()`, `fail()`, `cancel()` before writing the new state
macro_rules! debug_assert_terminal_sticky {
    ($was_terminal:expr) => {
        debug_assert!(
            !$was_terminal,
            "INV-DC-04 violated: terminal state would be overwritten"
        )
    };
}

// INV-DC-03 (FIFO delivery order) has no useful in-place assertion: the
// buffer is a VecDeque and delivery pops the front. It is covered by the
// property tests instead.

pub(crate) use debug_assert_buffer_bounded;
pub(crate) use debug_assert_delivery_bounded;
pub(crate) use debug_assert_terminal_sticky;
