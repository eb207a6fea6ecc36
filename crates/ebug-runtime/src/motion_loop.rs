//! [`MotionLoop`] – the fast control loop.
//!
//! Sole owner of the motors, the [`NavigationEngine`] and [`RobotState`].
//! Every cycle it either executes exactly one queued [`Command`] or, with
//! autonomy on, gives the engine one tick. A new command is only seen after
//! the primitive in flight returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ebug_hal::{Clock, MotionExecutor, MotionOutcome};
use ebug_kernel::Watchdog;
use ebug_middleware::{CommandReceiver, StatusBoard, TelemetryBus};
use ebug_types::{Command, CommandKind, MotorConfig, RobotError, RobotState, TelemetryFrame};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::cadence::Cadence;
use crate::navigator::{NavigationEngine, TickOutcome};

/// Watchdog id of the motion loop.
pub const MOTION_LOOP: &str = "motion";

/// What one [`MotionLoop::step`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopStep {
    /// No command pending and autonomy off.
    Idle,
    Command(Command),
    Navigation(TickOutcome),
    /// A primitive failed; the motors were emergency-stopped.
    Fault(RobotError),
}

pub struct MotionLoop {
    motion: Box<dyn MotionExecutor>,
    engine: NavigationEngine,
    commands: CommandReceiver,
    status: StatusBoard,
    bus: TelemetryBus,
    clock: Arc<dyn Clock>,
    tick: Duration,
    max_magnitude: i32,
}

impl MotionLoop {
    pub fn new(
        motion: Box<dyn MotionExecutor>,
        engine: NavigationEngine,
        commands: CommandReceiver,
        status: StatusBoard,
        bus: TelemetryBus,
        clock: Arc<dyn Clock>,
        tick: Duration,
    ) -> Self {
        Self {
            engine: engine.with_status_board(status.clone()),
            motion,
            commands,
            status,
            bus,
            clock,
            tick,
            max_magnitude: MotorConfig::default().max_command_magnitude,
        }
    }

    /// Clamp command magnitudes to `max` cm or degrees.
    pub fn with_max_magnitude(mut self, max: i32) -> Self {
        self.max_magnitude = max.max(0);
        self
    }

    pub fn engine(&self) -> &NavigationEngine {
        &self.engine
    }

    /// Run one cycle without pacing.
    pub fn step(&mut self) -> LoopStep {
        let step = if let Some(cmd) = self.commands.try_pop() {
            match self.execute(cmd) {
                Ok(()) => {
                    self.notify(format!("Command executed: {cmd}"));
                    LoopStep::Command(cmd)
                }
                Err(e) => self.fault(e),
            }
        } else if self.engine.is_autonomous() {
            match self.engine.tick(self.motion.as_mut()) {
                Ok(outcome) => LoopStep::Navigation(outcome),
                Err(e) => self.fault(e),
            }
        } else {
            LoopStep::Idle
        };
        self.status.set_navigation(self.engine.stats());
        step
    }

    /// Loop until `shutdown` is raised, then stop the motors.
    pub fn run(mut self, shutdown: Arc<AtomicBool>, watchdog: Arc<Mutex<Watchdog>>) {
        info!(tick_ms = self.tick.as_millis() as u64, "motion loop started");
        let mut cadence = Cadence::new(MOTION_LOOP, self.tick, self.clock.clone());
        while !shutdown.load(Ordering::Relaxed) {
            cadence.begin();
            self.step();
            watchdog.lock().heartbeat(MOTION_LOOP);
            cadence.finish();
        }
        self.engine.deactivate();
        if let Err(e) = self.motion.stop() {
            warn!(error = %e, "failed to stop motors on shutdown");
        }
        self.transition(RobotState::Idle);
        info!("motion loop stopped");
    }

    fn execute(&mut self, cmd: Command) -> Result<(), RobotError> {
        let magnitude = if cmd.magnitude() > self.max_magnitude {
            warn!(command = %cmd, max = self.max_magnitude, "magnitude clamped");
            self.max_magnitude
        } else {
            cmd.magnitude().max(0)
        } as f32;
        debug!(command = %cmd, "executing command");
        match cmd.kind() {
            CommandKind::Forward => {
                self.transition(RobotState::MovingForward);
                let result = self.motion.move_forward(magnitude);
                self.settle(result)
            }
            CommandKind::Backward => {
                self.transition(RobotState::MovingBackward);
                let result = self.motion.move_backward(magnitude);
                self.settle(result)
            }
            CommandKind::TurnLeft => {
                self.transition(RobotState::TurningLeft);
                let result = self.motion.rotate_left(magnitude);
                self.settle(result)
            }
            CommandKind::TurnRight => {
                self.transition(RobotState::TurningRight);
                let result = self.motion.rotate_right(magnitude);
                self.settle(result)
            }
            CommandKind::Stop | CommandKind::AutonomyOff => {
                self.engine.disable_autonomy(self.motion.as_mut())?;
                self.transition(RobotState::Idle);
                Ok(())
            }
            CommandKind::AutonomyOn => {
                self.transition(RobotState::Autonomous);
                self.engine.enable_autonomy();
                Ok(())
            }
        }
    }

    /// Return to the resting state after a direct motion primitive.
    fn settle(&mut self, result: Result<MotionOutcome, RobotError>) -> Result<(), RobotError> {
        let resting = if self.engine.is_autonomous() {
            RobotState::Autonomous
        } else {
            RobotState::Idle
        };
        self.transition(resting);
        let outcome = result?;
        if let MotionOutcome::Interrupted { completed, requested } = outcome {
            warn!(completed, requested, "motion stopped short by interlock");
        }
        Ok(())
    }

    fn fault(&mut self, e: RobotError) -> LoopStep {
        error!(error = %e, "motion fault, stopping");
        if let Err(stop_err) = self.motion.emergency_stop() {
            error!(error = %stop_err, "emergency stop failed");
        }
        self.engine.deactivate();
        self.transition(RobotState::Idle);
        self.notify(format!("ERROR: {e}"));
        LoopStep::Fault(e)
    }

    fn transition(&self, state: RobotState) {
        if self.status.state() == state {
            return;
        }
        self.status.set_state(state);
        self.notify(state.to_string());
    }

    fn notify(&self, status: String) {
        if !self.bus.is_connected() {
            return;
        }
        if let Err(e) = self.bus.publish(TelemetryFrame::status(status, self.clock.now_ms())) {
            debug!(error = %e, "status frame not delivered");
        }
    }
}
