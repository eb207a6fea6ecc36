//! Differential stepper drive.
//!
//! [`StepperMotion`] turns motion primitives into pulse trains on a
//! [`StepDriver`]. Both wheels share one step line per pulse; direction lines
//! pick forward, backward or an in-place spin.

use std::sync::Arc;
use std::time::Duration;

use ebug_types::{MotorConfig, RobotError};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::motion::{DriveGeometry, Interlock, MotionExecutor, MotionOutcome};

/// Pin-level access to a pair of stepper drivers (A4988 class).
pub trait StepDriver: Send {
    /// Energise (`true`) or release (`false`) both driver stages.
    fn set_enabled(&mut self, enabled: bool) -> Result<(), RobotError>;

    /// Set the direction lines. `true` rolls that wheel forward.
    fn set_direction(&mut self, left_forward: bool, right_forward: bool)
    -> Result<(), RobotError>;

    /// Drive both step lines high or low.
    fn write_step(&mut self, high: bool) -> Result<(), RobotError>;
}

/// One burst of step pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseTrain {
    pub steps: u32,
    pub half_period: Duration,
    /// Poll the interlock before every n-th step (including step 0).
    pub check_every: Option<u32>,
}

/// [`MotionExecutor`] over a [`StepDriver`].
pub struct StepperMotion<D: StepDriver> {
    driver: D,
    clock: Arc<dyn Clock>,
    geometry: DriveGeometry,
    interlock: Option<Box<dyn Interlock>>,
    speed_us: u32,
    min_speed_us: u32,
    max_speed_us: u32,
    check_every: u32,
}

impl<D: StepDriver> StepperMotion<D> {
    /// Build the drive and energise the motors.
    pub fn new(mut driver: D, clock: Arc<dyn Clock>, cfg: &MotorConfig) -> Result<Self, RobotError> {
        driver.set_enabled(true)?;
        info!(
            steps_per_rev = cfg.steps_per_rev,
            speed_us = cfg.default_speed_us,
            "Motor control initialized"
        );
        Ok(Self {
            driver,
            clock,
            geometry: DriveGeometry::from_config(cfg),
            interlock: None,
            speed_us: cfg.default_speed_us,
            min_speed_us: cfg.min_speed_us,
            max_speed_us: cfg.max_speed_us,
            check_every: cfg.interlock_every_steps.max(1),
        })
    }

    /// Attach the interlock polled during forward motion.
    pub fn with_interlock(mut self, interlock: Box<dyn Interlock>) -> Self {
        self.interlock = Some(interlock);
        self
    }

    pub fn geometry(&self) -> &DriveGeometry {
        &self.geometry
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Emit `train`, stopping early if the interlock trips.
    pub fn run(&mut self, train: PulseTrain) -> Result<MotionOutcome, RobotError> {
        for i in 0..train.steps {
            if let (Some(every), Some(interlock)) = (train.check_every, &self.interlock) {
                if i % every == 0 {
                    if let Err(e) = interlock.check() {
                        warn!(step = i, requested = train.steps, error = %e, "Emergency stop: obstacle detected");
                        return Ok(MotionOutcome::Interrupted {
                            completed: i,
                            requested: train.steps,
                        });
                    }
                }
            }
            self.driver.write_step(true)?;
            self.clock.sleep(train.half_period);
            self.driver.write_step(false)?;
            self.clock.sleep(train.half_period);
        }
        Ok(MotionOutcome::Completed { steps: train.steps })
    }

    fn train(&self, steps: u32, check_every: Option<u32>) -> PulseTrain {
        PulseTrain {
            steps,
            half_period: Duration::from_micros(u64::from(self.speed_us)),
            check_every,
        }
    }

    fn pulse_stop(&mut self, hold: Duration) -> Result<(), RobotError> {
        self.driver.set_enabled(false)?;
        self.clock.sleep(hold);
        self.driver.set_enabled(true)
    }
}

impl<D: StepDriver> MotionExecutor for StepperMotion<D> {
    fn move_forward(&mut self, cm: f32) -> Result<MotionOutcome, RobotError> {
        let steps = self.geometry.distance_to_steps(cm);
        debug!(cm, steps, "Moving forward");
        self.driver.set_direction(true, true)?;
        self.run(self.train(steps, Some(self.check_every)))
    }

    fn move_backward(&mut self, cm: f32) -> Result<MotionOutcome, RobotError> {
        let steps = self.geometry.distance_to_steps(cm);
        debug!(cm, steps, "Moving backward");
        self.driver.set_direction(false, false)?;
        self.run(self.train(steps, None))
    }

    fn rotate(&mut self, degrees: f32) -> Result<MotionOutcome, RobotError> {
        let steps = self.geometry.angle_to_steps(degrees);
        debug!(degrees, steps, "Rotating");
        let right = degrees > 0.0;
        self.driver.set_direction(right, !right)?;
        self.run(self.train(steps, None))
    }

    fn stop(&mut self) -> Result<(), RobotError> {
        debug!("Stopping motors");
        self.pulse_stop(Duration::from_millis(10))
    }

    fn emergency_stop(&mut self) -> Result<(), RobotError> {
        warn!("EMERGENCY STOP");
        self.pulse_stop(Duration::from_millis(100))
    }

    fn set_speed(&mut self, half_period_us: u32) -> Result<(), RobotError> {
        if !(self.min_speed_us..=self.max_speed_us).contains(&half_period_us) {
            return Err(RobotError::InvalidSpeed {
                requested: half_period_us,
                min: self.min_speed_us,
                max: self.max_speed_us,
            });
        }
        self.speed_us = half_period_us;
        info!(speed_us = half_period_us, "Motor speed set");
        Ok(())
    }

    fn speed(&self) -> u32 {
        self.speed_us
    }
}
