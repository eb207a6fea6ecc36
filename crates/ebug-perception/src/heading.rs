//! Gyroscope heading integration.
//!
//! The heading is dead-reckoned from the z-axis rate:
//!
//! ```text
//! heading += ((raw − offset) / lsb_per_dps) · dt
//! ```
//!
//! Updates closer together than the configured interval are ignored, so the
//! integrator can be polled from a loop of any cadence.
//!
//! # Example
//!
//! ```rust
//! use ebug_perception::heading::HeadingIntegrator;
//!
//! let mut h = HeadingIntegrator::new(131.0, 10, 0);
//! // 90 °/s for 100 ms
//! assert!(h.update(100, 90 * 131));
//! assert!((h.heading() - 9.0).abs() < 1e-3);
//! ```

/// Wrap an angle into `[0, 360)`.
pub fn wrap_degrees(deg: f32) -> f32 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

#[derive(Debug, Clone)]
pub struct HeadingIntegrator {
    heading_deg: f32,
    offset_raw: f32,
    lsb_per_dps: f32,
    interval_ms: u64,
    last_update_ms: u64,
}

impl HeadingIntegrator {
    pub fn new(lsb_per_dps: f32, interval_ms: u64, now_ms: u64) -> Self {
        Self {
            heading_deg: 0.0,
            offset_raw: 0.0,
            lsb_per_dps,
            interval_ms,
            last_update_ms: now_ms,
        }
    }

    /// `true` once at least one interval has passed since the last update.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_update_ms) >= self.interval_ms
    }

    /// Integrate `raw` over the time since the last update. Returns `false`
    /// (and changes nothing) when called before the interval elapsed.
    pub fn update(&mut self, now_ms: u64, raw: i16) -> bool {
        if !self.is_due(now_ms) {
            return false;
        }
        let dt_s = now_ms.saturating_sub(self.last_update_ms) as f32 / 1000.0;
        self.last_update_ms = now_ms;
        let rate_dps = (f32::from(raw) - self.offset_raw) / self.lsb_per_dps;
        self.heading_deg = wrap_degrees(self.heading_deg + rate_dps * dt_s);
        true
    }

    /// Consume an interval without integrating, e.g. after a failed read.
    pub fn skip(&mut self, now_ms: u64) {
        self.last_update_ms = now_ms;
    }

    pub fn heading(&self) -> f32 {
        self.heading_deg
    }

    pub fn reset(&mut self) {
        self.heading_deg = 0.0;
    }

    pub fn offset(&self) -> f32 {
        self.offset_raw
    }

    /// Set the resting z-rate to the mean of `samples`. An empty slice
    /// leaves the offset untouched.
    pub fn calibrate(&mut self, samples: &[i16]) {
        if samples.is_empty() {
            return;
        }
        let sum: i64 = samples.iter().map(|&s| i64::from(s)).sum();
        self.offset_raw = (sum / samples.len() as i64) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_are_rate_limited() {
        let mut h = HeadingIntegrator::new(131.0, 10, 0);
        assert!(!h.update(5, 1310));
        assert_eq!(h.heading(), 0.0);
        assert!(h.update(10, 1310));
        // 10 °/s for 10 ms
        assert!((h.heading() - 0.1).abs() < 1e-4);
    }

    #[test]
    fn heading_wraps_both_ways() {
        let mut h = HeadingIntegrator::new(131.0, 10, 0);
        // -100 °/s for 1 s
        h.update(1000, -100 * 131);
        assert!((h.heading() - 260.0).abs() < 1e-3);
        // +200 °/s for 1 s
        h.update(2000, 200 * 131);
        assert!((h.heading() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn calibration_offset_cancels_bias() {
        let mut h = HeadingIntegrator::new(131.0, 10, 0);
        h.calibrate(&[40, 42, 38, 40]);
        assert_eq!(h.offset(), 40.0);
        h.update(1000, 40);
        assert_eq!(h.heading(), 0.0);
    }

    #[test]
    fn skip_drops_the_elapsed_interval() {
        let mut h = HeadingIntegrator::new(131.0, 10, 0);
        h.skip(500);
        h.update(510, 131);
        assert!((h.heading() - 0.01).abs() < 1e-5);
    }

    #[test]
    fn reset_zeroes_heading_only() {
        let mut h = HeadingIntegrator::new(131.0, 10, 0);
        h.calibrate(&[5]);
        h.update(1000, 136);
        h.reset();
        assert_eq!(h.heading(), 0.0);
        assert_eq!(h.offset(), 5.0);
    }

    #[test]
    fn wrap_never_returns_360() {
        assert_eq!(wrap_degrees(-1e-9), 0.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert!((wrap_degrees(-90.0) - 270.0).abs() < 1e-4);
    }
}
