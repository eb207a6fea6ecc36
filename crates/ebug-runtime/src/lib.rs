//! `ebug-runtime` – Navigation engine and control loops.
//!
//! Everything that decides where the robot goes and keeps the three control
//! loops running lives here.
//!
//! # Modules
//!
//! - [`navigator`] – [`NavigationEngine`][navigator::NavigationEngine]:
//!   the per-tick decision (advance, sweep-and-turn, emergency, recovery),
//!   plus the dead-end and perimeter diagnostics.
//! - [`path_memory`] – [`PathMemory`][path_memory::PathMemory]: the ring
//!   buffer of recently explored directions that breaks oscillation.
//! - [`scoring`] – [`score_direction`][scoring::score_direction]: distance,
//!   angle and recency combined into one score.
//! - [`stuck`] – [`StuckDetector`][stuck::StuckDetector]: counts consecutive
//!   blocked sweeps and signals when to recover.
//! - [`maneuvers`] – [`RecoveryManeuver`][maneuvers::RecoveryManeuver] and
//!   [`emergency_maneuver`][maneuvers::emergency_maneuver].
//! - [`random`] – [`RandomSource`][random::RandomSource]: injected
//!   randomness, seedable for reproducible runs and scriptable in tests.
//! - [`motion_loop`] – [`MotionLoop`][motion_loop::MotionLoop]: pops one
//!   command per cycle or ticks the engine; sole owner of the motors.
//! - [`sensing_loop`] – [`SensingLoop`][sensing_loop::SensingLoop]: heading
//!   integration and the periodic sensor snapshot.
//! - [`supervisor`] – [`Supervisor`][supervisor::Supervisor]: heartbeat,
//!   queue status and watchdog sweep.
//! - [`coordinator`] – [`Coordinator`][coordinator::Coordinator]: builds the
//!   loops and runs each on its own thread.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: initialises
//!   the global `tracing` subscriber with an optional OTLP span exporter.

mod cadence;
pub mod coordinator;
pub mod maneuvers;
pub mod motion_loop;
pub mod navigator;
pub mod path_memory;
pub mod random;
pub mod scoring;
pub mod sensing_loop;
pub mod stuck;
pub mod supervisor;
pub mod telemetry;

pub use coordinator::{Coordinator, RobotParts};
pub use navigator::{CriticalReading, NavigationEngine, ScanReport, TickOutcome};
pub use random::{FixedSequence, RandomSource, RngSource};
