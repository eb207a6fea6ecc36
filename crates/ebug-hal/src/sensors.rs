//! Raw sensor traits.
//!
//! These sit at the boundary with the physical devices: echo timing on the
//! ultrasonic rangefinder, register reads on the IMU, the battery ADC.
//! Conversion to engineering units happens one layer up, in
//! `ebug-perception`.

use ebug_types::RobotError;

/// Ultrasonic time-of-flight rangefinder (HC-SR04 class).
pub trait Rangefinder: Send {
    /// Fire a trigger pulse and return the echo pulse width in microseconds,
    /// or `None` if no echo arrived within `timeout_us`.
    fn echo_us(&mut self, timeout_us: u32) -> Option<u32>;
}

/// Six-axis inertial measurement unit (MPU-6050 class).
pub trait Imu: Send {
    /// `true` when the device answers on its bus.
    fn test_connection(&mut self) -> bool;

    /// Raw gyroscope z-axis rate.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::HardwareFault`] if the register read fails.
    fn gyro_z_raw(&mut self) -> Result<i16, RobotError>;

    /// Raw accelerometer reading `[x, y, z]`.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::HardwareFault`] if the register read fails.
    fn accel_raw(&mut self) -> Result<[i16; 3], RobotError>;

    /// Raw die temperature register.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::HardwareFault`] if the register read fails.
    fn temperature_raw(&mut self) -> Result<i16, RobotError>;
}

/// Battery state-of-charge source.
pub trait BatteryGauge: Send {
    /// Remaining charge in percent, `None` when no gauge is fitted.
    fn percent(&mut self) -> Option<f32>;
}
