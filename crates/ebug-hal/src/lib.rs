//! `ebug-hal` – Hardware Abstraction Layer.
//!
//! The rest of the firmware only ever talks to the traits defined here, so
//! the stepper drivers, the ultrasonic rangefinder and the IMU can be swapped
//! for the in-process simulator without touching navigation logic.
//!
//! # Modules
//!
//! - [`clock`] – [`Clock`][clock::Clock]: the time source every delay goes
//!   through, with a real [`SystemClock`][clock::SystemClock] and a
//!   [`VirtualClock`][clock::VirtualClock] for tests.
//! - [`sensors`] – raw sensor traits ([`Rangefinder`][sensors::Rangefinder],
//!   [`Imu`][sensors::Imu], [`BatteryGauge`][sensors::BatteryGauge]).
//! - [`distance`] – [`DistanceProvider`][distance::DistanceProvider]: the
//!   filtered, sentinel-capped distance interface navigation consumes.
//! - [`motion`] – [`MotionExecutor`][motion::MotionExecutor], the blocking
//!   motion primitives, plus the [`Interlock`][motion::Interlock] seam and
//!   [`DriveGeometry`][motion::DriveGeometry].
//! - [`stepper`] – [`StepperMotion`][stepper::StepperMotion]: a
//!   `MotionExecutor` that drives a [`StepDriver`][stepper::StepDriver] with
//!   interlocked pulse trains.
//! - [`sim`] – simulated world, stepper driver and sensors for headless runs.

pub mod clock;
pub mod distance;
pub mod motion;
pub mod sensors;
pub mod sim;
pub mod stepper;

pub use clock::{Clock, SystemClock, VirtualClock};
pub use distance::DistanceProvider;
pub use motion::{DriveGeometry, Interlock, MotionExecutor, MotionOutcome};
pub use sensors::{BatteryGauge, Imu, Rangefinder};
pub use stepper::{PulseTrain, StepDriver, StepperMotion};
