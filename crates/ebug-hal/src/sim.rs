//! In-process simulation of the chassis and its sensors.
//!
//! A [`SimWorld`] holds the robot pose and a set of circular obstacles. The
//! simulated stepper driver moves the pose on every rising step edge; the
//! simulated rangefinder and IMU read it back. This lets the whole firmware
//! run headless on a workstation or in CI.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ebug_hal::clock::VirtualClock;
//! use ebug_hal::motion::MotionExecutor;
//! use ebug_hal::sim::SimRig;
//! use ebug_hal::stepper::StepperMotion;
//! use ebug_types::MotorConfig;
//!
//! let clock = Arc::new(VirtualClock::new());
//! let rig = SimRig::new(clock.clone())
//!     .with_obstacle(0.0, 100.0, 10.0)
//!     .build();
//! let world = rig.world.clone();
//!
//! let mut motion = StepperMotion::new(rig.driver, clock, &MotorConfig::default())
//!     .expect("sim driver never fails");
//! motion.move_forward(20.0).expect("sim driver never fails");
//! assert!(world.lock().distance_ahead() < 71.0);
//! ```

use std::f32::consts::PI;
use std::sync::Arc;

use ebug_types::{MotorConfig, RobotError};
use parking_lot::Mutex;

use crate::clock::Clock;
use crate::motion::DriveGeometry;
use crate::sensors::{BatteryGauge, Imu, Rangefinder};
use crate::stepper::StepDriver;

/// Speed of sound as used by the rangefinder conversion, in cm/µs.
const SOUND_CM_PER_US: f32 = 0.034;

// ────────────────────────────────────────────────────────────────────────────
// World model
// ────────────────────────────────────────────────────────────────────────────

/// A round obstacle in world coordinates (centimetres).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

/// Robot pose plus obstacles.
///
/// Heading is in degrees, clockwise from the +y axis, always in `[0, 360)`.
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    pub x: f32,
    pub y: f32,
    pub heading_deg: f32,
    /// Total distance rolled, in either direction.
    pub odometer_cm: f32,
    pub obstacles: Vec<Obstacle>,
}

/// World shared between the simulated devices.
pub type SharedWorld = Arc<Mutex<SimWorld>>;

impl SimWorld {
    /// Roll along the current heading. Negative `cm` reverses.
    pub fn advance(&mut self, cm: f32) {
        let rad = self.heading_deg.to_radians();
        self.x += cm * rad.sin();
        self.y += cm * rad.cos();
        self.odometer_cm += cm.abs();
    }

    /// Spin in place. Positive `degrees` turns clockwise.
    pub fn turn(&mut self, degrees: f32) {
        self.heading_deg = (self.heading_deg + degrees).rem_euclid(360.0);
    }

    /// Distance from the robot to the nearest obstacle along its heading,
    /// or `f32::INFINITY` if the ray hits nothing.
    pub fn distance_ahead(&self) -> f32 {
        let rad = self.heading_deg.to_radians();
        let (dx, dy) = (rad.sin(), rad.cos());
        self.obstacles
            .iter()
            .filter_map(|o| {
                let (vx, vy) = (o.x - self.x, o.y - self.y);
                let r2 = o.radius * o.radius;
                let dist2 = vx * vx + vy * vy;
                if dist2 <= r2 {
                    return Some(0.0);
                }
                let along = vx * dx + vy * dy;
                if along < 0.0 {
                    return None;
                }
                let miss2 = dist2 - along * along;
                if miss2 > r2 {
                    return None;
                }
                Some(along - (r2 - miss2).sqrt())
            })
            .fold(f32::INFINITY, f32::min)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated stepper driver
// ────────────────────────────────────────────────────────────────────────────

/// A [`StepDriver`] that moves the [`SimWorld`] pose instead of a motor.
pub struct SimStepDriver {
    world: SharedWorld,
    cm_per_step: f32,
    deg_per_step: f32,
    enabled: bool,
    left_forward: bool,
    right_forward: bool,
}

impl SimStepDriver {
    pub fn new(world: SharedWorld, cfg: &MotorConfig) -> Self {
        let geometry = DriveGeometry::from_config(cfg);
        Self {
            world,
            cm_per_step: geometry.cm_per_step(),
            deg_per_step: geometry.deg_per_step(),
            enabled: false,
            left_forward: true,
            right_forward: true,
        }
    }
}

impl StepDriver for SimStepDriver {
    fn set_enabled(&mut self, enabled: bool) -> Result<(), RobotError> {
        self.enabled = enabled;
        Ok(())
    }

    fn set_direction(&mut self, left_forward: bool, right_forward: bool) -> Result<(), RobotError> {
        self.left_forward = left_forward;
        self.right_forward = right_forward;
        Ok(())
    }

    fn write_step(&mut self, high: bool) -> Result<(), RobotError> {
        if !high || !self.enabled {
            return Ok(());
        }
        let mut world = self.world.lock();
        match (self.left_forward, self.right_forward) {
            (true, true) => world.advance(self.cm_per_step),
            (false, false) => world.advance(-self.cm_per_step),
            (true, false) => world.turn(self.deg_per_step),
            (false, true) => world.turn(-self.deg_per_step),
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated sensors
// ────────────────────────────────────────────────────────────────────────────

/// Ultrasonic rangefinder reading the [`SimWorld`].
pub struct SimRangefinder {
    world: SharedWorld,
}

impl SimRangefinder {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl Rangefinder for SimRangefinder {
    fn echo_us(&mut self, timeout_us: u32) -> Option<u32> {
        let cm = self.world.lock().distance_ahead();
        let echo = cm * 2.0 / SOUND_CM_PER_US;
        if echo.is_finite() && echo < timeout_us as f32 {
            Some(echo.round() as u32)
        } else {
            None
        }
    }
}

/// IMU whose gyro reports the rate of change of the simulated heading.
pub struct SimImu {
    world: SharedWorld,
    clock: Arc<dyn Clock>,
    lsb_per_dps: f32,
    last_heading: f32,
    last_odometer: f32,
    last_us: u64,
    temperature_c: f32,
}

impl SimImu {
    pub fn new(world: SharedWorld, clock: Arc<dyn Clock>) -> Self {
        let (heading, odometer) = {
            let w = world.lock();
            (w.heading_deg, w.odometer_cm)
        };
        let last_us = clock.now_us();
        Self {
            world,
            clock,
            lsb_per_dps: 131.0,
            last_heading: heading,
            last_odometer: odometer,
            last_us,
            temperature_c: 24.0,
        }
    }
}

impl Imu for SimImu {
    fn test_connection(&mut self) -> bool {
        true
    }

    fn gyro_z_raw(&mut self) -> Result<i16, RobotError> {
        let heading = self.world.lock().heading_deg;
        let now = self.clock.now_us();
        let dt_s = now.saturating_sub(self.last_us) as f32 / 1_000_000.0;
        // Shortest signed angular difference, in (-180, 180].
        let mut delta = (heading - self.last_heading).rem_euclid(360.0);
        if delta > 180.0 {
            delta -= 360.0;
        }
        self.last_heading = heading;
        self.last_us = now;
        if dt_s <= 0.0 {
            return Ok(0);
        }
        let raw = (delta / dt_s * self.lsb_per_dps).clamp(i16::MIN as f32, i16::MAX as f32);
        Ok(raw as i16)
    }

    fn accel_raw(&mut self) -> Result<[i16; 3], RobotError> {
        let odometer = self.world.lock().odometer_cm;
        let moved = odometer > self.last_odometer;
        self.last_odometer = odometer;
        let x = if moved { 1200 } else { 0 };
        Ok([x, 0, 16384])
    }

    fn temperature_raw(&mut self) -> Result<i16, RobotError> {
        Ok(((self.temperature_c - 36.53) * 340.0) as i16)
    }
}

/// Battery that never drains.
pub struct SimBattery {
    percent: f32,
}

impl SimBattery {
    pub fn new(percent: f32) -> Self {
        Self { percent }
    }
}

impl BatteryGauge for SimBattery {
    fn percent(&mut self) -> Option<f32> {
        Some(self.percent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimRig builder
// ────────────────────────────────────────────────────────────────────────────

/// The full set of simulated devices sharing one world.
pub struct SimHardware {
    pub world: SharedWorld,
    pub driver: SimStepDriver,
    pub rangefinder: SimRangefinder,
    pub imu: SimImu,
    pub battery: SimBattery,
}

/// Builder for [`SimHardware`].
pub struct SimRig {
    clock: Arc<dyn Clock>,
    motor: MotorConfig,
    world: SimWorld,
}

impl SimRig {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            motor: MotorConfig::default(),
            world: SimWorld::default(),
        }
    }

    pub fn with_motor_config(mut self, motor: MotorConfig) -> Self {
        self.motor = motor;
        self
    }

    /// Add a round obstacle centred at `(x, y)`.
    pub fn with_obstacle(mut self, x: f32, y: f32, radius: f32) -> Self {
        self.world.obstacles.push(Obstacle { x, y, radius });
        self
    }

    /// Enclose the start position in a ring of posts `radius` cm away.
    pub fn with_arena(mut self, radius: f32, posts: usize) -> Self {
        let post_radius = PI * radius / posts.max(1) as f32;
        for i in 0..posts {
            let a = 2.0 * PI * i as f32 / posts as f32;
            self.world.obstacles.push(Obstacle {
                x: radius * a.sin(),
                y: radius * a.cos(),
                radius: post_radius,
            });
        }
        self
    }

    pub fn build(self) -> SimHardware {
        let world: SharedWorld = Arc::new(Mutex::new(self.world));
        SimHardware {
            driver: SimStepDriver::new(world.clone(), &self.motor),
            rangefinder: SimRangefinder::new(world.clone()),
            imu: SimImu::new(world.clone(), self.clock),
            battery: SimBattery::new(100.0),
            world,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use std::time::Duration;

    fn rig() -> (SimHardware, VirtualClock) {
        let clock = VirtualClock::new();
        let hw = SimRig::new(Arc::new(clock.clone()))
            .with_obstacle(0.0, 60.0, 10.0)
            .build();
        (hw, clock)
    }

    #[test]
    fn distance_ahead_hits_obstacle_surface() {
        let (hw, _) = rig();
        let d = hw.world.lock().distance_ahead();
        assert!((d - 50.0).abs() < 0.01, "got {d}");
    }

    #[test]
    fn empty_bearing_sees_nothing() {
        let (hw, _) = rig();
        hw.world.lock().turn(90.0);
        assert!(hw.world.lock().distance_ahead().is_infinite());
    }

    #[test]
    fn rangefinder_echo_matches_distance() {
        let (mut hw, _) = rig();
        let echo = hw.rangefinder.echo_us(30_000).unwrap();
        let cm = echo as f32 * SOUND_CM_PER_US / 2.0;
        assert!((cm - 50.0).abs() < 0.1);

        hw.world.lock().turn(180.0);
        assert_eq!(hw.rangefinder.echo_us(30_000), None);
    }

    #[test]
    fn driver_moves_pose_only_when_enabled() {
        let (mut hw, _) = rig();
        hw.driver.set_direction(true, true).unwrap();
        hw.driver.write_step(true).unwrap();
        assert_eq!(hw.world.lock().odometer_cm, 0.0);

        hw.driver.set_enabled(true).unwrap();
        for _ in 0..10 {
            hw.driver.write_step(true).unwrap();
            hw.driver.write_step(false).unwrap();
        }
        let w = hw.world.lock();
        assert!((w.y - 10.0 * DriveGeometry::from_config(&MotorConfig::default()).cm_per_step()).abs() < 1e-3);
    }

    #[test]
    fn spin_steps_turn_clockwise_for_right() {
        let (mut hw, _) = rig();
        hw.driver.set_enabled(true).unwrap();
        hw.driver.set_direction(false, true).unwrap();
        hw.driver.write_step(true).unwrap();
        let heading = hw.world.lock().heading_deg;
        assert!(heading > 359.0, "left spin wraps below zero, got {heading}");
    }

    #[test]
    fn gyro_reports_heading_rate() {
        let (mut hw, clock) = rig();
        clock.advance(Duration::from_millis(100));
        hw.world.lock().turn(10.0);
        // 10° in 0.1 s = 100 °/s → 13100 LSB.
        let raw = hw.imu.gyro_z_raw().unwrap();
        assert!((raw - 13_100).abs() <= 1, "got {raw}");

        clock.advance(Duration::from_millis(100));
        hw.world.lock().turn(-20.0);
        assert!(hw.imu.gyro_z_raw().unwrap() < 0);
    }

    #[test]
    fn temperature_register_encodes_ambient() {
        let (mut hw, _) = rig();
        let raw = hw.imu.temperature_raw().unwrap();
        let celsius = raw as f32 / 340.0 + 36.53;
        assert!((celsius - 24.0).abs() < 0.01);
    }

    #[test]
    fn arena_surrounds_start() {
        let clock = Arc::new(VirtualClock::new());
        let hw = SimRig::new(clock).with_arena(100.0, 12).build();
        let mut w = hw.world.lock();
        for _ in 0..8 {
            assert!(w.distance_ahead() < 100.0);
            w.turn(45.0);
        }
    }
}
