//! [`SensorHub`] – the robot's single view of its sensors.
//!
//! The hub is shared between the sensing loop (which builds snapshots and
//! integrates the heading) and the motion loop (which takes fresh distance
//! readings for navigation and the proximity interlock). Every hardware
//! handle sits behind its own `parking_lot::Mutex`; the cached distance is an
//! atomic so the interlock never waits on a lock held by a snapshot.
//!
//! Sensor faults never escape as errors from distance reads. A timed-out or
//! out-of-range echo becomes the `max_distance_cm` sentinel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use ebug_hal::clock::Clock;
use ebug_hal::distance::DistanceProvider;
use ebug_hal::sensors::{BatteryGauge, Imu, Rangefinder};
use ebug_types::{RobotError, SensorConfig, SensorSnapshot};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::heading::HeadingIntegrator;

/// Speed of sound in cm/µs.
const SOUND_CM_PER_US: f32 = 0.034;

/// Pause between gyro samples while calibrating.
const CALIBRATION_SAMPLE_MS: u64 = 3;

/// Per-sensor result of [`SensorHub::self_test`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfTestReport {
    pub rangefinder_ok: bool,
    /// The reading taken during the test (the sentinel on failure).
    pub distance_cm: f32,
    pub imu_ok: bool,
}

impl SelfTestReport {
    pub fn passed(&self) -> bool {
        self.rangefinder_ok && self.imu_ok
    }
}

/// An `f32` that can be read and replaced atomically.
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(v: f32) -> Self {
        Self(AtomicU32::new(v.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    fn store(&self, v: f32) {
        self.0.store(v.to_bits(), Ordering::Release);
    }
}

pub struct SensorHub {
    config: SensorConfig,
    clock: Arc<dyn Clock>,
    rangefinder: Mutex<Box<dyn Rangefinder>>,
    imu: Mutex<Box<dyn Imu>>,
    battery: Mutex<Box<dyn BatteryGauge>>,
    heading: Mutex<HeadingIntegrator>,
    last_accel: Mutex<Option<[i16; 3]>>,
    current_distance: AtomicF32,
    last_temperature: AtomicF32,
}

impl SensorHub {
    /// Build the hub. The cached distance starts at the sentinel and the
    /// heading at 0°.
    pub fn new(
        config: SensorConfig,
        imu_update_ms: u64,
        clock: Arc<dyn Clock>,
        rangefinder: Box<dyn Rangefinder>,
        imu: Box<dyn Imu>,
        battery: Box<dyn BatteryGauge>,
    ) -> Self {
        let heading = HeadingIntegrator::new(config.gyro_lsb_per_dps, imu_update_ms, clock.now_ms());
        Self {
            current_distance: AtomicF32::new(config.max_distance_cm),
            last_temperature: AtomicF32::new(0.0),
            config,
            clock,
            rangefinder: Mutex::new(rangefinder),
            imu: Mutex::new(imu),
            battery: Mutex::new(battery),
            heading: Mutex::new(heading),
            last_accel: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    fn echo_to_cm(&self, echo_us: Option<u32>) -> f32 {
        let Some(echo) = echo_us.filter(|&e| e > 0) else {
            return self.config.max_distance_cm;
        };
        let cm = echo as f32 * SOUND_CM_PER_US / 2.0;
        if cm < self.config.min_valid_cm || cm > self.config.max_valid_cm {
            return self.config.max_distance_cm;
        }
        cm
    }

    // ── Heading ─────────────────────────────────────────────────────────────

    /// Integrate the gyro if the heading interval has elapsed. Returns
    /// `true` when the heading was updated. A failed gyro read keeps the
    /// previous heading.
    pub fn update_heading(&self) -> bool {
        let now = self.clock.now_ms();
        let mut heading = self.heading.lock();
        if !heading.is_due(now) {
            return false;
        }
        match self.imu.lock().gyro_z_raw() {
            Ok(raw) => heading.update(now, raw),
            Err(e) => {
                warn!(error = %e, "Gyro read failed; keeping previous heading");
                heading.skip(now);
                false
            }
        }
    }

    pub fn heading(&self) -> f32 {
        self.heading.lock().heading()
    }

    pub fn reset_heading(&self) {
        self.heading.lock().reset();
        info!("Heading reset to 0");
    }

    /// Average `samples` resting gyro readings into the calibration offset.
    /// The robot must stay still while this runs.
    ///
    /// # Errors
    ///
    /// Returns the first IMU read error; the offset is left unchanged.
    pub fn calibrate_gyro(&self, samples: usize) -> Result<f32, RobotError> {
        info!(samples, "Calibrating gyro, keep the robot still");
        let mut readings = Vec::with_capacity(samples);
        for _ in 0..samples {
            readings.push(self.imu.lock().gyro_z_raw()?);
            self.clock.sleep(Duration::from_millis(CALIBRATION_SAMPLE_MS));
        }
        let mut heading = self.heading.lock();
        heading.calibrate(&readings);
        info!(offset = heading.offset(), "Gyro calibration complete");
        Ok(heading.offset())
    }

    // ── Other sensors ───────────────────────────────────────────────────────

    /// Die temperature in °C. On a read error the last good value is
    /// returned.
    pub fn temperature_c(&self) -> f32 {
        match self.imu.lock().temperature_raw() {
            Ok(raw) => {
                let c = f32::from(raw) / 340.0 + 36.53;
                self.last_temperature.store(c);
                c
            }
            Err(e) => {
                warn!(error = %e, "Temperature read failed");
                self.last_temperature.load()
            }
        }
    }

    pub fn battery_pct(&self) -> f32 {
        self.battery
            .lock()
            .percent()
            .unwrap_or(self.config.battery_default_pct)
    }

    /// `true` when the summed absolute accelerometer change since the
    /// previous call exceeds `motion_threshold`. The first call only primes
    /// the reference and reports `false`.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::HardwareFault`] if the accelerometer read fails.
    pub fn is_moving(&self) -> Result<bool, RobotError> {
        let accel = self.imu.lock().accel_raw()?;
        let mut last = self.last_accel.lock();
        let moving = match *last {
            None => false,
            Some(prev) => {
                let delta: i32 = accel
                    .iter()
                    .zip(prev.iter())
                    .map(|(&a, &b)| (i32::from(a) - i32::from(b)).abs())
                    .sum();
                delta > self.config.motion_threshold
            }
        };
        *last = Some(accel);
        Ok(moving)
    }

    /// Obstacle check against the cached distance.
    pub fn is_obstacle_detected(&self, min_obstacle_cm: f32) -> bool {
        self.current_distance() < min_obstacle_cm
    }

    /// Take one reading of every sensor.
    pub fn snapshot(&self) -> SensorSnapshot {
        let distance_cm = self.read_distance();
        self.update_heading();
        let snapshot = SensorSnapshot {
            distance_cm,
            heading_deg: self.heading(),
            temperature_c: self.temperature_c(),
            battery_pct: self.battery_pct(),
            timestamp_ms: self.clock.now_ms(),
        };
        debug!(
            distance_cm = snapshot.distance_cm,
            heading_deg = snapshot.heading_deg,
            "Sensor snapshot"
        );
        snapshot
    }

    /// Ping the rangefinder and the IMU. Failures are logged, never fatal.
    pub fn self_test(&self) -> SelfTestReport {
        let distance_cm = self.read_distance();
        let rangefinder_ok = distance_cm < self.config.max_distance_cm;
        if rangefinder_ok {
            info!(distance_cm, "Ultrasonic sensor test PASSED");
        } else {
            warn!("Ultrasonic sensor test FAILED");
        }
        let imu_ok = self.imu.lock().test_connection();
        if imu_ok {
            info!("IMU test PASSED");
        } else {
            warn!("IMU test FAILED");
        }
        SelfTestReport {
            rangefinder_ok,
            distance_cm,
            imu_ok,
        }
    }
}

impl DistanceProvider for SensorHub {
    fn current_distance(&self) -> f32 {
        self.current_distance.load()
    }

    fn read_distance(&self) -> f32 {
        let echo = self.rangefinder.lock().echo_us(self.config.echo_timeout_us);
        let cm = self.echo_to_cm(echo);
        if cm < self.config.max_distance_cm {
            self.current_distance.store(cm);
        }
        cm
    }

    fn filtered_distance(&self, samples: usize) -> f32 {
        let interval = Duration::from_millis(self.config.filter_interval_ms);
        let mut total = 0.0;
        let mut valid = 0usize;
        for _ in 0..samples {
            let reading = self.read_distance();
            if reading < self.config.max_distance_cm {
                total += reading;
                valid += 1;
            }
            self.clock.sleep(interval);
        }
        if valid == 0 {
            return self.config.max_distance_cm;
        }
        total / valid as f32
    }

    fn max_distance(&self) -> f32 {
        self.config.max_distance_cm
    }
}
