//! Shared numeric constants for the engine crate.

use std::time::Duration;

// ── Gestures ────────────────────────────────────────────────────

/// Changes smaller than this, in percentage points, are treated as jitter.
pub const DRAG_THRESHOLD: f64 = 0.1;

/// Minimum width and height, in percent of the parent.
pub const MIN_SIZE: f64 = 1.0;

// ── History ─────────────────────────────────────────────────────

/// Entries kept before the oldest is evicted.
pub const HISTORY_CAPACITY: usize = 1000;

// ── Stacking ────────────────────────────────────────────────────

/// Base `z-index` for proxies.
pub const Z_BASE: i64 = 999_000;

/// `z-index` step per manipulable depth level.
pub const Z_DEPTH_STEP: i64 = 1000;

// ── Re-measurement ──────────────────────────────────────────────

/// Fixed delays at which a degenerate image measurement is retried.
pub const REMEASURE_DELAYS: [Duration; 3] = [
    Duration::from_millis(100),
    Duration::from_millis(500),
    Duration::from_millis(1000),
];
