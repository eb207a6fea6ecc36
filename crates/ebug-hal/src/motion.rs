//! Motion primitives.
//!
//! [`MotionExecutor`] is the contract the motion loop and the navigation
//! engine drive the wheels through. Every primitive blocks the calling loop
//! until it finishes or its safety [`Interlock`] trips; there is no
//! mid-primitive cancellation.

use std::f32::consts::PI;

use ebug_types::{MotorConfig, RobotError};

/// How a motion primitive ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// Every requested step was driven.
    Completed { steps: u32 },
    /// An interlock tripped; the robot stopped short.
    Interrupted { completed: u32, requested: u32 },
}

impl MotionOutcome {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, MotionOutcome::Interrupted { .. })
    }
}

/// Blocking, safety-interlocked motion primitives.
///
/// Angles are signed degrees: positive rotates right (clockwise), negative
/// rotates left.
pub trait MotionExecutor: Send {
    /// Drive forward `cm` centimetres, polling the interlock as it goes.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::HardwareFault`] if the driver rejects a command.
    fn move_forward(&mut self, cm: f32) -> Result<MotionOutcome, RobotError>;

    /// Drive backward `cm` centimetres.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::HardwareFault`] if the driver rejects a command.
    fn move_backward(&mut self, cm: f32) -> Result<MotionOutcome, RobotError>;

    /// Rotate in place by `degrees`.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::HardwareFault`] if the driver rejects a command.
    fn rotate(&mut self, degrees: f32) -> Result<MotionOutcome, RobotError>;

    /// Halt the wheels. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::HardwareFault`] if the driver rejects a command.
    fn stop(&mut self) -> Result<(), RobotError>;

    /// Halt the wheels with a longer driver cut-off. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::HardwareFault`] if the driver rejects a command.
    fn emergency_stop(&mut self) -> Result<(), RobotError>;

    /// Set the step half-period in microseconds.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::InvalidSpeed`] outside the safe range; the
    /// current speed is kept.
    fn set_speed(&mut self, half_period_us: u32) -> Result<(), RobotError>;

    /// Current step half-period in microseconds.
    fn speed(&self) -> u32;

    fn rotate_left(&mut self, degrees: f32) -> Result<MotionOutcome, RobotError> {
        self.rotate(-degrees)
    }

    fn rotate_right(&mut self, degrees: f32) -> Result<MotionOutcome, RobotError> {
        self.rotate(degrees)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Interlock
// ────────────────────────────────────────────────────────────────────────────

/// A safety condition polled while a primitive is running.
///
/// Implementations live in `ebug-kernel`; the executor only needs to know
/// whether it may keep stepping.
pub trait Interlock: Send + Sync {
    /// Human-readable name used in fault messages.
    fn name(&self) -> &str;

    /// Return `Ok(())` while motion may continue, or
    /// [`RobotError::InterlockTripped`] when it must stop.
    fn check(&self) -> Result<(), RobotError>;
}

// ────────────────────────────────────────────────────────────────────────────
// DriveGeometry
// ────────────────────────────────────────────────────────────────────────────

/// Converts linear distances and in-place rotations into step counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveGeometry {
    pub steps_per_rev: u32,
    pub wheel_circumference_mm: f32,
    pub robot_width_mm: f32,
}

impl DriveGeometry {
    pub fn from_config(cfg: &MotorConfig) -> Self {
        Self {
            steps_per_rev: cfg.steps_per_rev,
            wheel_circumference_mm: PI * cfg.wheel_diameter_mm,
            robot_width_mm: cfg.robot_width_mm,
        }
    }

    /// Steps needed to roll `cm` centimetres. Non-positive distances need
    /// no steps.
    ///
    /// ```rust
    /// use ebug_hal::motion::DriveGeometry;
    /// use ebug_types::MotorConfig;
    ///
    /// let geometry = DriveGeometry::from_config(&MotorConfig::default());
    /// assert_eq!(geometry.distance_to_steps(10.0), 97);
    /// assert_eq!(geometry.distance_to_steps(-5.0), 0);
    /// ```
    pub fn distance_to_steps(&self, cm: f32) -> u32 {
        if cm <= 0.0 {
            return 0;
        }
        ((cm * 10.0 / self.wheel_circumference_mm) * self.steps_per_rev as f32) as u32
    }

    /// Steps each wheel turns to rotate the chassis by `degrees` in place.
    /// The sign only selects the direction, so it is ignored here.
    pub fn angle_to_steps(&self, degrees: f32) -> u32 {
        let arc_mm = self.robot_width_mm * PI * degrees.abs() / 360.0;
        ((arc_mm / self.wheel_circumference_mm) * self.steps_per_rev as f32) as u32
    }

    /// Linear travel of one step, in centimetres.
    pub fn cm_per_step(&self) -> f32 {
        self.wheel_circumference_mm / 10.0 / self.steps_per_rev as f32
    }

    /// Chassis rotation of one in-place step, in degrees.
    pub fn deg_per_step(&self) -> f32 {
        let wheel_travel_mm = self.wheel_circumference_mm / self.steps_per_rev as f32;
        wheel_travel_mm * 360.0 / (PI * self.robot_width_mm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> DriveGeometry {
        DriveGeometry::from_config(&MotorConfig::default())
    }

    #[test]
    fn distance_to_steps_matches_wheel_circumference() {
        // 65 mm wheel: circumference ≈ 204.2 mm → one revolution per ~20.4 cm.
        let g = geometry();
        assert_eq!(g.distance_to_steps(10.0), 97);
        assert_eq!(g.distance_to_steps(20.42), 199);
        assert_eq!(g.distance_to_steps(0.0), 0);
    }

    #[test]
    fn angle_to_steps_ignores_sign() {
        let g = geometry();
        assert_eq!(g.angle_to_steps(90.0), g.angle_to_steps(-90.0));
        // 90° on a 150 mm track: arc ≈ 117.8 mm → ≈ 115 steps.
        assert_eq!(g.angle_to_steps(90.0), 115);
    }

    #[test]
    fn per_step_units_invert_conversions() {
        let g = geometry();
        let steps = g.angle_to_steps(180.0) as f32;
        assert!((steps * g.deg_per_step() - 180.0).abs() < 2.0);
        let steps = g.distance_to_steps(50.0) as f32;
        assert!((steps * g.cm_per_step() - 50.0).abs() < 0.5);
    }

    #[test]
    fn outcome_reports_interruption() {
        assert!(MotionOutcome::Interrupted { completed: 50, requested: 97 }.is_interrupted());
        assert!(!MotionOutcome::Completed { steps: 97 }.is_interrupted());
    }
}
