//! Debug assertion macros for lifecycle invariants.
//!
//! Active only in debug builds, zero overhead in release.

// =============================================================================
// INV-SB-01: Dispose Hook Fires on Every Terminal Path
// =============================================================================

/// Assert that the dispose hook was consumed by the terminal sequence.
///
/// **Invariant**: `terminal → on_dispose fired (at most once, Option::take)`
///
/// Used in: `Worker::finish()` after the hook sequence
macro_rules! debug_assert_dispose_fired {
    ($dispose_slot_empty:expr) => {
        debug_assert!(
            $dispose_slot_empty,
            "INV-SB-01 violated: terminal path did not consume the dispose hook"
        )
    };
}

// =============================================================================
// INV-SB-02: Cancel Hook Only on the Cancelled Path, Before Dispose
// =============================================================================

/// Assert the cancel hook fired exactly on the cancelled path.
///
/// **Invariant**: `cancelled ↔ on_cancel fired`, and ordering is
/// cancel-hook → dispose-hook → source release (enforced by control flow in
/// `finish`, asserted here on the slots).
macro_rules! debug_assert_cancel_path {
    ($cancelled:expr, $cancel_slot_empty:expr, $had_cancel_hook:expr) => {
        debug_assert!(
            if $cancelled {
                $cancel_slot_empty || !$had_cancel_hook
            } else {
                !$had_cancel_hook || !$cancel_slot_empty
            },
            "INV-SB-02 violated: cancel hook fired on the wrong terminal path"
        )
    };
}

// =============================================================================
// INV-SB-03: Source Released Exactly Once
// =============================================================================

/// Assert the source close sequence ran exactly once.
///
/// **Invariant**: `finish() runs once per subscription` — the worker loop
/// returns immediately after, so a second entry would be a logic error.
macro_rules! debug_assert_source_released {
    ($first_release:expr) => {
        debug_assert!(
            $first_release,
            "INV-SB-03 violated: source release sequence entered twice"
        )
    };
}

pub(crate) use debug_assert_cancel_path;
pub(crate) use debug_assert_dispose_fired;
pub(crate) use debug_assert_source_released;
