//! Tunable constants for every subsystem.
//!
//! All values default to the calibrated constants the robot ships with. The
//! scoring weights and distance thresholds were tuned empirically on the
//! real chassis; treat them as configuration, not derived quantities.

use serde::{Deserialize, Serialize};

use crate::RobotError;

/// Complete robot configuration, one section per subsystem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub motor: MotorConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

impl RobotConfig {
    /// Reject values the control loops cannot run with.
    pub fn validate(&self) -> Result<(), RobotError> {
        let nav = &self.navigation;
        if nav.scan_step_deg <= 0 {
            return Err(RobotError::Config("scan_step_deg must be positive".into()));
        }
        if nav.scan_start_deg > nav.scan_end_deg {
            return Err(RobotError::Config(format!(
                "scan window is empty ({}..={})",
                nav.scan_start_deg, nav.scan_end_deg
            )));
        }
        if nav.critical_distance_cm >= nav.min_obstacle_cm {
            return Err(RobotError::Config(format!(
                "critical_distance_cm ({}) must be below min_obstacle_cm ({})",
                nav.critical_distance_cm, nav.min_obstacle_cm
            )));
        }
        if nav.path_memory_size == 0 {
            return Err(RobotError::Config("path_memory_size must be at least 1".into()));
        }
        if nav.samples_per_angle == 0 {
            return Err(RobotError::Config("samples_per_angle must be at least 1".into()));
        }
        if nav.stuck_threshold == 0 {
            return Err(RobotError::Config("stuck_threshold must be at least 1".into()));
        }
        let motor = &self.motor;
        if motor.min_speed_us > motor.max_speed_us {
            return Err(RobotError::Config(format!(
                "motor speed range is inverted ({}..={})",
                motor.min_speed_us, motor.max_speed_us
            )));
        }
        if !(motor.min_speed_us..=motor.max_speed_us).contains(&motor.default_speed_us) {
            return Err(RobotError::Config(format!(
                "default_speed_us {} is outside {}..={}",
                motor.default_speed_us, motor.min_speed_us, motor.max_speed_us
            )));
        }
        if motor.max_command_magnitude <= 0 {
            return Err(RobotError::Config("max_command_magnitude must be positive".into()));
        }
        if motor.steps_per_rev == 0 || motor.wheel_diameter_mm <= 0.0 {
            return Err(RobotError::Config("drive geometry must be positive".into()));
        }
        if self.timing.command_queue_size == 0 {
            return Err(RobotError::Config("command_queue_size must be at least 1".into()));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Navigation
// ─────────────────────────────────────────────────────────────────────────────

/// Thresholds and weights of the obstacle-avoidance engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Readings below this are unusable paths (score 0).
    pub min_obstacle_cm: f32,
    /// Readings below this force the emergency maneuver.
    pub critical_distance_cm: f32,
    pub scan_start_deg: i32,
    pub scan_end_deg: i32,
    pub scan_step_deg: i32,
    pub samples_per_angle: usize,
    pub stabilization_ms: u64,
    pub sample_interval_ms: u64,
    /// Fraction of the score lost at a 90° turn.
    pub angle_penalty: f32,
    /// Multiplier applied to recently explored directions.
    pub recency_penalty: f32,
    pub recency_tolerance_deg: f32,
    pub recency_window_ms: u64,
    pub path_memory_size: usize,
    /// Minimum spacing between two navigation ticks.
    pub tick_interval_ms: u64,
    pub advance_step_cm: f32,
    pub stuck_threshold: u32,
    pub emergency_backup_cm: f32,
    pub emergency_turn_deg: i32,
    pub emergency_jitter_deg: i32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            min_obstacle_cm: 25.0,
            critical_distance_cm: 15.0,
            scan_start_deg: -60,
            scan_end_deg: 60,
            scan_step_deg: 10,
            samples_per_angle: 3,
            stabilization_ms: 100,
            sample_interval_ms: 50,
            angle_penalty: 0.5,
            recency_penalty: 0.3,
            recency_tolerance_deg: 20.0,
            recency_window_ms: 30_000,
            path_memory_size: 10,
            tick_interval_ms: 500,
            advance_step_cm: 10.0,
            stuck_threshold: 3,
            emergency_backup_cm: 15.0,
            emergency_turn_deg: 160,
            emergency_jitter_deg: 20,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Motors
// ─────────────────────────────────────────────────────────────────────────────

/// Stepper drive geometry and pulse timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    pub steps_per_rev: u32,
    pub wheel_diameter_mm: f32,
    /// Distance between the wheel contact points.
    pub robot_width_mm: f32,
    /// Half-period of a step pulse in microseconds (lower is faster).
    pub default_speed_us: u32,
    pub min_speed_us: u32,
    pub max_speed_us: u32,
    /// Forward motion polls the safety interlock every this many steps.
    pub interlock_every_steps: u32,
    /// Largest distance (cm) or angle (degrees) a single operator command
    /// may request. Larger magnitudes are clamped.
    pub max_command_magnitude: i32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            steps_per_rev: 200,
            wheel_diameter_mm: 65.0,
            robot_width_mm: 150.0,
            default_speed_us: 400,
            min_speed_us: 200,
            max_speed_us: 1000,
            interlock_every_steps: 50,
            max_command_magnitude: 1000,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sensors
// ─────────────────────────────────────────────────────────────────────────────

/// Rangefinder and IMU calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Sentinel reported for timed-out or out-of-range echoes.
    pub max_distance_cm: f32,
    pub min_valid_cm: f32,
    pub max_valid_cm: f32,
    pub echo_timeout_us: u32,
    /// Spacing between samples of a filtered distance reading.
    pub filter_interval_ms: u64,
    /// Gyro sensitivity (131 LSB per °/s at the ±250 °/s range).
    pub gyro_lsb_per_dps: f32,
    pub battery_default_pct: f32,
    /// Summed accelerometer delta above which the robot counts as moving.
    pub motion_threshold: i32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            max_distance_cm: 999.0,
            min_valid_cm: 2.0,
            max_valid_cm: 400.0,
            echo_timeout_us: 30_000,
            filter_interval_ms: 20,
            gyro_lsb_per_dps: 131.0,
            battery_default_pct: 100.0,
            motion_threshold: 500,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loop timing
// ─────────────────────────────────────────────────────────────────────────────

/// Cadences of the control loops and capacity of the command channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub motion_tick_ms: u64,
    pub sensor_update_ms: u64,
    pub imu_update_ms: u64,
    pub heartbeat_ms: u64,
    pub status_report_ms: u64,
    pub command_queue_size: usize,
    pub watchdog_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            motion_tick_ms: 10,
            sensor_update_ms: 1000,
            imu_update_ms: 10,
            heartbeat_ms: 10_000,
            status_report_ms: 30_000,
            command_queue_size: 10,
            watchdog_timeout_ms: 20_000,
        }
    }
}
