//! `ebug-kernel` – Safety supervision.
//!
//! Nothing in here moves the robot. The kernel decides when motion must stop
//! and notices when a control loop has gone quiet.
//!
//! # Modules
//!
//! - [`interlock`] – [`ProximityInterlock`][interlock::ProximityInterlock]:
//!   the forward-motion guard polled by the stepper drive, tripping when a
//!   fresh distance reading falls below the critical threshold.
//! - [`watchdog`] – [`Watchdog`][watchdog::Watchdog]: tracks heartbeats from
//!   the motion, sensing and supervisor loops so the supervisor can report a
//!   frozen loop.

pub mod interlock;
pub mod watchdog;

pub use interlock::ProximityInterlock;
pub use watchdog::{ComponentHealth, Watchdog};
