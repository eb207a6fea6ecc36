//! [`StuckDetector`] – counts consecutive failed scans.
//!
//! A scan that finds no usable direction is a failure; any successful move
//! resets the streak. When the streak reaches the threshold the caller
//! should run a recovery maneuver and [`reset`][StuckDetector::reset].
//!
//! ```rust
//! use ebug_runtime::stuck::StuckDetector;
//!
//! let mut stuck = StuckDetector::new(3);
//! assert!(!stuck.record_failure());
//! assert!(!stuck.record_failure());
//! assert!(stuck.record_failure()); // third blocked scan → recover
//! stuck.reset();
//! assert_eq!(stuck.count(), 0);
//! ```

#[derive(Debug, Clone)]
pub struct StuckDetector {
    threshold: u32,
    count: u32,
}

impl StuckDetector {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            count: 0,
        }
    }

    /// Count one failed scan. Returns `true` once the streak has reached
    /// the threshold.
    pub fn record_failure(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        self.is_stuck()
    }

    pub fn is_stuck(&self) -> bool {
        self.count >= self.threshold
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_is_not_stuck() {
        let mut stuck = StuckDetector::new(4);
        for _ in 0..3 {
            assert!(!stuck.record_failure());
        }
        assert_eq!(stuck.count(), 3);
    }

    #[test]
    fn stays_stuck_until_reset() {
        let mut stuck = StuckDetector::new(2);
        stuck.record_failure();
        assert!(stuck.record_failure());
        assert!(stuck.record_failure());
        stuck.reset();
        assert!(!stuck.is_stuck());
    }

    #[test]
    fn threshold_one_triggers_immediately() {
        let mut stuck = StuckDetector::new(1);
        assert!(stuck.record_failure());
    }
}
