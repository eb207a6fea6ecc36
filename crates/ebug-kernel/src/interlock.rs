//! [`ProximityInterlock`] – stops forward motion in front of an obstacle.

use std::sync::Arc;

use ebug_hal::distance::DistanceProvider;
use ebug_hal::motion::Interlock;
use ebug_types::RobotError;

/// Trips when a fresh forward reading is below `critical_cm`.
///
/// Each check takes its own reading rather than trusting the cached value,
/// which the sensing loop only refreshes once per second.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use ebug_hal::distance::DistanceProvider;
/// use ebug_hal::motion::Interlock;
/// use ebug_kernel::interlock::ProximityInterlock;
///
/// struct Fixed(f32);
/// impl DistanceProvider for Fixed {
///     fn current_distance(&self) -> f32 { self.0 }
///     fn read_distance(&self) -> f32 { self.0 }
///     fn filtered_distance(&self, _samples: usize) -> f32 { self.0 }
///     fn max_distance(&self) -> f32 { 999.0 }
/// }
///
/// let guard = ProximityInterlock::new(Arc::new(Fixed(12.0)), 15.0);
/// assert!(guard.check().is_err());
/// ```
pub struct ProximityInterlock {
    distance: Arc<dyn DistanceProvider>,
    critical_cm: f32,
}

impl ProximityInterlock {
    pub fn new(distance: Arc<dyn DistanceProvider>, critical_cm: f32) -> Self {
        Self {
            distance,
            critical_cm,
        }
    }
}

impl Interlock for ProximityInterlock {
    fn name(&self) -> &str {
        "proximity"
    }

    fn check(&self) -> Result<(), RobotError> {
        let cm = self.distance.read_distance();
        if cm < self.critical_cm {
            return Err(RobotError::InterlockTripped {
                interlock: self.name().to_string(),
                details: format!("obstacle at {cm:.1}cm (critical {:.1}cm)", self.critical_cm),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        readings: Mutex<Vec<f32>>,
    }

    impl DistanceProvider for Scripted {
        fn current_distance(&self) -> f32 {
            999.0
        }

        fn read_distance(&self) -> f32 {
            self.readings.lock().unwrap().pop().unwrap_or(999.0)
        }

        fn filtered_distance(&self, _samples: usize) -> f32 {
            self.read_distance()
        }

        fn max_distance(&self) -> f32 {
            999.0
        }
    }

    #[test]
    fn trips_below_critical_only() {
        let provider = Arc::new(Scripted {
            readings: Mutex::new(vec![14.9, 15.0, 40.0]),
        });
        let guard = ProximityInterlock::new(provider, 15.0);
        assert!(guard.check().is_ok());
        assert!(guard.check().is_ok(), "exactly critical is still allowed");
        let err = guard.check().unwrap_err();
        assert!(matches!(err, RobotError::InterlockTripped { ref interlock, .. } if interlock == "proximity"));
    }

    #[test]
    fn uses_fresh_reading_not_cached() {
        // Cached value says clear, the fresh reading does not.
        let provider = Arc::new(Scripted {
            readings: Mutex::new(vec![5.0]),
        });
        let guard = ProximityInterlock::new(provider, 15.0);
        assert!(guard.check().is_err());
    }

    #[test]
    fn sentinel_never_trips() {
        let provider = Arc::new(Scripted {
            readings: Mutex::new(vec![]),
        });
        let guard = ProximityInterlock::new(provider, 15.0);
        assert!(guard.check().is_ok());
    }
}
