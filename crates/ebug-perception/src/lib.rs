//! `ebug-perception` – sensor interpretation.
//!
//! Turns raw echo timings and IMU registers into the distances, headings and
//! snapshots the control loops reason about.
//!
//! # Modules
//!
//! - [`heading`] – [`HeadingIntegrator`][heading::HeadingIntegrator]:
//!   rate-limited gyro integration with calibration offset and `[0, 360)`
//!   wrap.
//! - [`sensor_hub`] – [`SensorHub`][sensor_hub::SensorHub]: owns the sensor
//!   handles, implements [`DistanceProvider`][ebug_hal::DistanceProvider] and
//!   produces [`SensorSnapshot`][ebug_types::SensorSnapshot]s.

pub mod heading;
pub mod sensor_hub;

pub use heading::HeadingIntegrator;
pub use sensor_hub::{SelfTestReport, SensorHub};
