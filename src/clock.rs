//! Time sources
//!
//! The scheduler and judgment timing only need a monotonic millisecond
//! counter; where it comes from is up to the caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// Monotonic "now" in milliseconds
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall-clock backed by `Instant`. Clones share the same zero point.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    zero: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            zero: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> i64 {
        self.zero.elapsed().as_millis() as i64
    }
}

/// Manually advanced clock for tests and offline runs
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::Release);
    }

    /// Move forward; negative steps are ignored to stay monotonic
    pub fn advance(&self, delta_ms: i64) {
        if delta_ms > 0 {
            self.now.fetch_add(delta_ms, Ordering::AcqRel);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::Acquire)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// Optional audio engine hook for tight sync
pub trait AudioPosition {
    /// Instant (on the session clock) at which playback began
    fn start_instant_ms(&self) -> Option<i64>;
}
