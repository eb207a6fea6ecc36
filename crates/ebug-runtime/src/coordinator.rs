//! [`Coordinator`] – wires the loops together and owns their threads.
//!
//! ```text
//!  intake (REPL / radio) ──CommandSender──► [bounded mpsc] ──► MotionLoop ──► motors
//!                                                                 │
//!                                                   NavigationEngine ◄── SensorHub
//!  SensingLoop ──► SnapshotCell (watch) ──► readers              │
//!       └──────────────┬─────────────────────────────────────────┘
//!                      ▼
//!               TelemetryBus (broadcast) ──► operator
//! ```
//!
//! The motion, sensing and supervisor loops each get a dedicated OS thread.
//! The intake side is whatever holds a [`CommandSender`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ebug_hal::sim::SimHardware;
use ebug_hal::{Clock, DistanceProvider, MotionExecutor, StepperMotion};
use ebug_kernel::{ProximityInterlock, Watchdog};
use ebug_middleware::{
    CommandSender, SnapshotReader, StatusBoard, TelemetryBus, command_channel, snapshot_cell,
};
use ebug_perception::SensorHub;
use ebug_types::{RobotConfig, RobotError};
use parking_lot::Mutex;
use tracing::{error, info};

use crate::motion_loop::{MOTION_LOOP, MotionLoop};
use crate::navigator::NavigationEngine;
use crate::random::RandomSource;
use crate::sensing_loop::{SENSING_LOOP, SensingLoop};
use crate::supervisor::Supervisor;

// ─────────────────────────────────────────────────────────────────────────────
// RobotParts
// ─────────────────────────────────────────────────────────────────────────────

/// The hardware-facing pieces a [`Coordinator`] runs against.
pub struct RobotParts {
    pub motion: Box<dyn MotionExecutor>,
    pub sensors: Arc<SensorHub>,
    pub random: Box<dyn RandomSource>,
    pub clock: Arc<dyn Clock>,
}

impl RobotParts {
    /// Assemble parts over simulated hardware: a [`SensorHub`] on the sim
    /// sensors and a [`StepperMotion`] guarded by a [`ProximityInterlock`].
    pub fn from_sim(
        config: &RobotConfig,
        hardware: SimHardware,
        clock: Arc<dyn Clock>,
        random: Box<dyn RandomSource>,
    ) -> Result<Self, RobotError> {
        let sensors = Arc::new(SensorHub::new(
            config.sensor.clone(),
            config.timing.imu_update_ms,
            clock.clone(),
            Box::new(hardware.rangefinder),
            Box::new(hardware.imu),
            Box::new(hardware.battery),
        ));
        let distance: Arc<dyn DistanceProvider> = sensors.clone();
        let motion = StepperMotion::new(hardware.driver, clock.clone(), &config.motor)?.with_interlock(
            Box::new(ProximityInterlock::new(distance, config.navigation.critical_distance_cm)),
        );
        Ok(Self {
            motion: Box::new(motion),
            sensors,
            random,
            clock,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Coordinator
// ─────────────────────────────────────────────────────────────────────────────

pub struct Coordinator {
    intake: CommandSender,
    status: StatusBoard,
    snapshots: SnapshotReader,
    bus: TelemetryBus,
    watchdog: Arc<Mutex<Watchdog>>,
    shutdown: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl Coordinator {
    /// Validate `config`, build the loops and start their threads.
    ///
    /// # Errors
    ///
    /// - [`RobotError::Config`] if `config` does not validate.
    /// - [`RobotError::Task`] if a thread cannot be spawned; loops already
    ///   started are shut down again.
    pub fn start(config: &RobotConfig, parts: RobotParts) -> Result<Self, RobotError> {
        config.validate()?;
        let timing = &config.timing;
        let clock = parts.clock;

        let (intake, commands) = command_channel(timing.command_queue_size);
        let (publisher, snapshots) = snapshot_cell();
        let status = StatusBoard::new();
        let bus = TelemetryBus::default();
        let watchdog = Arc::new(Mutex::new(Watchdog::new(clock.clone())));
        {
            let timeout = Duration::from_millis(timing.watchdog_timeout_ms);
            let mut watchdog = watchdog.lock();
            watchdog.register(MOTION_LOOP, timeout);
            watchdog.register(SENSING_LOOP, timeout);
        }

        let distance: Arc<dyn DistanceProvider> = parts.sensors.clone();
        let engine = NavigationEngine::new(config.navigation.clone(), distance, clock.clone(), parts.random);
        let motion_loop = MotionLoop::new(
            parts.motion,
            engine,
            commands,
            status.clone(),
            bus.clone(),
            clock.clone(),
            Duration::from_millis(timing.motion_tick_ms),
        )
        .with_max_magnitude(config.motor.max_command_magnitude);
        let sensing_loop = SensingLoop::new(
            parts.sensors,
            publisher,
            bus.clone(),
            clock.clone(),
            Duration::from_millis(timing.imu_update_ms),
            Duration::from_millis(timing.sensor_update_ms),
        );
        let supervisor = Supervisor::new(
            timing,
            watchdog.clone(),
            intake.clone(),
            status.clone(),
            bus.clone(),
            clock,
        );

        let mut coordinator = Self {
            intake,
            status,
            snapshots,
            bus,
            watchdog,
            shutdown: Arc::new(AtomicBool::new(false)),
            handles: Vec::with_capacity(3),
        };

        let (stop, wd) = (coordinator.shutdown.clone(), coordinator.watchdog.clone());
        coordinator.spawn("ebug-motion", move || motion_loop.run(stop, wd))?;
        let (stop, wd) = (coordinator.shutdown.clone(), coordinator.watchdog.clone());
        coordinator.spawn("ebug-sensing", move || sensing_loop.run(stop, wd))?;
        let stop = coordinator.shutdown.clone();
        coordinator.spawn("ebug-supervisor", move || supervisor.run(stop))?;

        info!(
            queue = timing.command_queue_size,
            motion_tick_ms = timing.motion_tick_ms,
            sensor_update_ms = timing.sensor_update_ms,
            "robot control loops running"
        );
        Ok(coordinator)
    }

    fn spawn(&mut self, name: &str, f: impl FnOnce() + Send + 'static) -> Result<(), RobotError> {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(f)
            .map_err(|e| RobotError::Task(format!("failed to spawn {name}: {e}")))?;
        self.handles.push(handle);
        Ok(())
    }

    /// Producer handle for the command channel.
    pub fn intake(&self) -> CommandSender {
        self.intake.clone()
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    pub fn snapshots(&self) -> SnapshotReader {
        self.snapshots.clone()
    }

    pub fn bus(&self) -> &TelemetryBus {
        &self.bus
    }

    /// Loops currently past their watchdog deadline.
    pub fn frozen_loops(&self) -> Vec<String> {
        self.watchdog.lock().check_all()
    }

    /// The flag the loops poll; setting it stops them without joining.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Stop every loop and wait for its thread to exit.
    pub fn shutdown(mut self) -> Result<(), RobotError> {
        self.join_all()
    }

    fn join_all(&mut self) -> Result<(), RobotError> {
        self.shutdown.store(true, Ordering::Relaxed);
        let mut result = Ok(());
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("unnamed").to_string();
            if handle.join().is_err() {
                error!(thread = %name, "control loop panicked");
                result = Err(RobotError::Task(format!("{name} panicked")));
            }
        }
        if result.is_ok() {
            info!("robot control loops stopped");
        }
        result
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            let _ = self.join_all();
        }
    }
}
