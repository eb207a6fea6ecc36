//! `ebug-types` – shared data model for the E-Bug control firmware.
//!
//! Every other crate in the workspace speaks in these types: the operator
//! [`Command`] flowing from intake to the motion loop, the [`RobotState`] the
//! motion loop owns, the [`SensorSnapshot`] the sensing loop publishes, the
//! [`PathMemoryEntry`] records the navigation engine keeps, and the outbound
//! [`TelemetryFrame`]s.
//!
//! Configuration records live in [`config`].

pub mod config;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{MotorConfig, NavigationConfig, RobotConfig, SensorConfig, TimingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// The operation an operator [`Command`] requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// Drive forward `magnitude` centimetres.
    Forward,
    /// Drive backward `magnitude` centimetres.
    Backward,
    /// Rotate left (counter-clockwise) `magnitude` degrees.
    TurnLeft,
    /// Rotate right (clockwise) `magnitude` degrees.
    TurnRight,
    /// Halt all motion and leave autonomous mode.
    Stop,
    /// Hand control to the navigation engine.
    AutonomyOn,
    /// Take control back from the navigation engine.
    AutonomyOff,
}

/// A single operator command.
///
/// Produced by command intake, consumed exactly once by the motion loop.
/// Fields are private so a command cannot be altered after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    kind: CommandKind,
    magnitude: i32,
}

impl Command {
    pub fn new(kind: CommandKind, magnitude: i32) -> Self {
        Self { kind, magnitude }
    }

    /// The default command: stop with magnitude 0.
    pub fn stop() -> Self {
        Self::new(CommandKind::Stop, 0)
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Distance in centimetres or angle in degrees, depending on [`kind`][Self::kind].
    pub fn magnitude(&self) -> i32 {
        self.magnitude
    }
}

impl Default for Command {
    fn default() -> Self {
        Self::stop()
    }
}

/// Renders the command in its inbound wire form (`F10`, `STOP`, `AUTO_NAV`, …).
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CommandKind::Forward => write!(f, "F{}", self.magnitude),
            CommandKind::Backward => write!(f, "B{}", self.magnitude),
            CommandKind::TurnLeft => write!(f, "L{}", self.magnitude),
            CommandKind::TurnRight => write!(f, "R{}", self.magnitude),
            CommandKind::Stop => write!(f, "STOP"),
            CommandKind::AutonomyOn => write!(f, "AUTO_NAV"),
            CommandKind::AutonomyOff => write!(f, "AUTO_OFF"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Robot and navigation state
// ─────────────────────────────────────────────────────────────────────────────

/// What the robot is doing right now. Owned by the motion loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RobotState {
    #[default]
    Idle,
    MovingForward,
    MovingBackward,
    TurningLeft,
    TurningRight,
    Scanning,
    Autonomous,
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RobotState::Idle => "idle",
            RobotState::MovingForward => "moving_forward",
            RobotState::MovingBackward => "moving_backward",
            RobotState::TurningLeft => "turning_left",
            RobotState::TurningRight => "turning_right",
            RobotState::Scanning => "scanning",
            RobotState::Autonomous => "autonomous",
        };
        f.write_str(name)
    }
}

/// Phase of the navigation engine's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NavPhase {
    /// Autonomy is off.
    #[default]
    Idle,
    /// Autonomy is on and the engine is advancing normally.
    Active,
    /// A scan-and-score sweep is in progress.
    Scanning,
    /// A randomized stuck-recovery maneuver is in progress.
    Recovering,
    /// The critical-proximity maneuver is in progress.
    Emergency,
}

/// Read-only summary of the navigation engine, used for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NavigationStats {
    pub autonomy_enabled: bool,
    pub phase: NavPhase,
    pub stuck_counter: u32,
    pub last_chosen_angle_deg: f32,
    /// Number of occupied path-memory slots.
    pub path_memory_entries: usize,
}

/// Everything the motion loop reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RobotStatus {
    pub state: RobotState,
    pub navigation: NavigationStats,
}

// ─────────────────────────────────────────────────────────────────────────────
// Sensing
// ─────────────────────────────────────────────────────────────────────────────

/// One consistent reading of every sensor, produced once per sensing tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub distance_cm: f32,
    /// Integrated heading, wrapped into `[0, 360)`.
    pub heading_deg: f32,
    pub temperature_c: f32,
    pub battery_pct: f32,
    /// Milliseconds since boot.
    pub timestamp_ms: u64,
}

/// A single scan result remembered by the navigation engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathMemoryEntry {
    /// Scan angle relative to the heading the sweep started from.
    pub angle_deg: f32,
    pub distance_cm: f32,
    pub timestamp_ms: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Telemetry
// ─────────────────────────────────────────────────────────────────────────────

/// Periodic sensor record sent to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorTelemetry {
    pub distance: f32,
    pub battery: f32,
    pub temperature: f32,
    pub heading: f32,
    pub timestamp: u64,
}

impl From<SensorSnapshot> for SensorTelemetry {
    fn from(s: SensorSnapshot) -> Self {
        Self {
            distance: s.distance_cm,
            battery: s.battery_pct,
            temperature: s.temperature_c,
            heading: s.heading_deg,
            timestamp: s.timestamp_ms,
        }
    }
}

/// Ad-hoc status string (state transitions, command acknowledgements,
/// heartbeats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTelemetry {
    pub status: String,
    pub timestamp: u64,
}

/// Outbound telemetry record. Serialises to the flat JSON objects the
/// operator app expects, e.g. `{"status":"heartbeat","timestamp":10000}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryFrame {
    Sensor(SensorTelemetry),
    Status(StatusTelemetry),
}

impl TelemetryFrame {
    pub fn status(status: impl Into<String>, timestamp: u64) -> Self {
        TelemetryFrame::Status(StatusTelemetry {
            status: status.into(),
            timestamp,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Workspace-wide error type.
///
/// Sensor faults never show up here: they degrade to the max-range sentinel
/// inside the sensing layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RobotError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Interlock '{interlock}' tripped: {details}")]
    InterlockTripped { interlock: String, details: String },

    #[error("Invalid motor speed {requested}us (allowed {min}..={max}us)")]
    InvalidSpeed { requested: u32, min: u32, max: u32 },

    #[error("Command queue full, dropped {0}")]
    ChannelFull(Command),

    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Task Error: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_display_uses_wire_form() {
        assert_eq!(Command::new(CommandKind::Forward, 10).to_string(), "F10");
        assert_eq!(Command::new(CommandKind::Backward, 15).to_string(), "B15");
        assert_eq!(Command::new(CommandKind::TurnLeft, 90).to_string(), "L90");
        assert_eq!(Command::new(CommandKind::TurnRight, 45).to_string(), "R45");
        assert_eq!(Command::stop().to_string(), "STOP");
        assert_eq!(Command::new(CommandKind::AutonomyOn, 0).to_string(), "AUTO_NAV");
        assert_eq!(Command::new(CommandKind::AutonomyOff, 0).to_string(), "AUTO_OFF");
    }

    #[test]
    fn default_command_is_stop_zero() {
        let cmd = Command::default();
        assert_eq!(cmd.kind(), CommandKind::Stop);
        assert_eq!(cmd.magnitude(), 0);
    }

    #[test]
    fn sensor_frame_serialises_flat() {
        let frame = TelemetryFrame::Sensor(SensorTelemetry::from(SensorSnapshot {
            distance_cm: 42.5,
            heading_deg: 90.0,
            temperature_c: 24.0,
            battery_pct: 100.0,
            timestamp_ms: 1000,
        }));
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["distance"], 42.5);
        assert_eq!(json["heading"], 90.0);
        assert_eq!(json["battery"], 100.0);
        assert_eq!(json["timestamp"], 1000);
        assert!(json.get("Sensor").is_none(), "frame must not be tagged");
    }

    #[test]
    fn status_frame_roundtrip() {
        let frame = TelemetryFrame::status("heartbeat", 10_000);
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"status":"heartbeat","timestamp":10000}"#);
        let back: TelemetryFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn robot_error_display() {
        let err = RobotError::ChannelFull(Command::new(CommandKind::Forward, 5));
        assert!(err.to_string().contains("F5"));

        let err = RobotError::InvalidSpeed { requested: 50, min: 200, max: 1000 };
        assert!(err.to_string().contains("50us"));
    }

    #[test]
    fn robot_state_defaults_to_idle() {
        assert_eq!(RobotStatus::default().state, RobotState::Idle);
        assert_eq!(RobotStatus::default().navigation.phase, NavPhase::Idle);
    }
}
