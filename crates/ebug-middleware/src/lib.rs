//! `ebug-middleware` – the wiring between the control loops.
//!
//! Moves commands, snapshots, status and telemetry between loops without
//! interpreting them.
//!
//! # Modules
//!
//! - [`command`] – [`parse_command`][command::parse_command]: decodes the
//!   operator's text commands (`F10`, `L90`, `STOP`, `AUTO_NAV`, …).
//! - [`channel`] – the bounded, drop-on-full command channel from intake to
//!   the motion loop.
//! - [`snapshot`] – the latest-value cell the sensing loop publishes
//!   [`SensorSnapshot`][ebug_types::SensorSnapshot]s through.
//! - [`status`] – [`StatusBoard`][status::StatusBoard]: the motion loop's
//!   published [`RobotStatus`][ebug_types::RobotStatus].
//! - [`bus`] – [`TelemetryBus`][bus::TelemetryBus]: broadcast of outbound
//!   telemetry frames plus their JSON encoding.

pub mod bus;
pub mod channel;
pub mod command;
pub mod snapshot;
pub mod status;

pub use bus::{TelemetryBus, TelemetryReceiver, encode_frame};
pub use channel::{CommandReceiver, CommandSender, command_channel};
pub use command::parse_command;
pub use snapshot::{SnapshotPublisher, SnapshotReader, snapshot_cell};
pub use status::StatusBoard;
