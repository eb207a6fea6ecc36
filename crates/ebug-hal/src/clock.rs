//! Time source for every delay and timestamp in the firmware.
//!
//! Motion primitives, stabilization pauses and loop cadences never call
//! `std::thread::sleep` directly; they go through a [`Clock`]. Production code
//! uses [`SystemClock`]. Tests use [`VirtualClock`], whose `sleep` advances
//! time instantly, so a full scan sweep runs in microseconds of wall time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A monotonic time source that can also suspend the calling thread.
pub trait Clock: Send + Sync {
    /// Microseconds since the clock was created.
    fn now_us(&self) -> u64;

    /// Suspend the calling thread for `duration`.
    fn sleep(&self, duration: Duration);

    /// Milliseconds since the clock was created.
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SystemClock
// ────────────────────────────────────────────────────────────────────────────

/// Wall-clock implementation backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    boot: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            boot: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_us(&self) -> u64 {
        self.boot.elapsed().as_micros() as u64
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// VirtualClock
// ────────────────────────────────────────────────────────────────────────────

/// Deterministic clock for tests and simulation.
///
/// Clones share the same time line. `sleep` returns immediately after
/// advancing the shared time.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use ebug_hal::clock::{Clock, VirtualClock};
///
/// let clock = VirtualClock::new();
/// clock.sleep(Duration::from_millis(500));
/// assert_eq!(clock.now_ms(), 500);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now_us: Arc<AtomicU64>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the time line at `ms` milliseconds.
    pub fn starting_at_ms(ms: u64) -> Self {
        let clock = Self::new();
        clock.advance(Duration::from_millis(ms));
        clock
    }

    /// Move time forward without sleeping.
    pub fn advance(&self, duration: Duration) {
        self.now_us
            .fetch_add(duration.as_micros() as u64, Ordering::SeqCst);
    }
}

impl Clock for VirtualClock {
    fn now_us(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
