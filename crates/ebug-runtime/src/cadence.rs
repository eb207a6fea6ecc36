//! Fixed-rate loop pacing.
//!
//! Each control loop brackets its work with [`Cadence::begin`] and
//! [`Cadence::finish`]; `finish` sleeps for whatever is left of the period
//! and logs when the cycle overran it.

use std::sync::Arc;
use std::time::Duration;

use ebug_hal::Clock;
use tracing::debug;

pub struct Cadence {
    name: &'static str,
    period: Duration,
    clock: Arc<dyn Clock>,
    cycle_start_us: u64,
}

impl Cadence {
    pub fn new(name: &'static str, period: Duration, clock: Arc<dyn Clock>) -> Self {
        let cycle_start_us = clock.now_us();
        Self {
            name,
            period,
            clock,
            cycle_start_us,
        }
    }

    pub fn begin(&mut self) {
        self.cycle_start_us = self.clock.now_us();
    }

    /// Sleep out the rest of the period. Returns the time the cycle took.
    pub fn finish(&self) -> Duration {
        let elapsed = Duration::from_micros(self.clock.now_us().saturating_sub(self.cycle_start_us));
        if elapsed < self.period {
            self.clock.sleep(self.period - elapsed);
        } else if elapsed > self.period + self.period / 4 {
            // Blocking motion primitives overrun the motion cadence routinely.
            debug!(loop_name = self.name, ?elapsed, target = ?self.period, "cycle overrun");
        }
        elapsed
    }
}
