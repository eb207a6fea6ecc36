//! [`Supervisor`] – heartbeat, status report and watchdog sweep.
//!
//! A slow loop that never touches hardware. It sends the periodic
//! `heartbeat` status frame, logs queue occupancy and drops, and warns about
//! any control loop whose watchdog deadline has passed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ebug_hal::Clock;
use ebug_kernel::Watchdog;
use ebug_middleware::{CommandSender, StatusBoard, TelemetryBus};
use ebug_types::{TelemetryFrame, TimingConfig};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cadence::Cadence;

/// Watchdog id of the supervisor itself.
pub const SUPERVISOR_LOOP: &str = "supervisor";

const SUPERVISOR_TICK: Duration = Duration::from_millis(100);

/// What one [`Supervisor::step`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupervisorReport {
    pub heartbeat_sent: bool,
    pub status_logged: bool,
    /// Loops past their watchdog deadline.
    pub frozen: Vec<String>,
}

pub struct Supervisor {
    watchdog: Arc<Mutex<Watchdog>>,
    intake: CommandSender,
    status: StatusBoard,
    bus: TelemetryBus,
    clock: Arc<dyn Clock>,
    heartbeat_ms: u64,
    status_report_ms: u64,
    last_heartbeat_ms: u64,
    last_report_ms: u64,
}

impl Supervisor {
    pub fn new(
        timing: &TimingConfig,
        watchdog: Arc<Mutex<Watchdog>>,
        intake: CommandSender,
        status: StatusBoard,
        bus: TelemetryBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.now_ms();
        Self {
            watchdog,
            intake,
            status,
            bus,
            clock,
            heartbeat_ms: timing.heartbeat_ms,
            status_report_ms: timing.status_report_ms,
            last_heartbeat_ms: now,
            last_report_ms: now,
        }
    }

    pub fn step(&mut self) -> SupervisorReport {
        let now = self.clock.now_ms();
        let mut report = SupervisorReport::default();

        let frozen = {
            let mut watchdog = self.watchdog.lock();
            watchdog.heartbeat(SUPERVISOR_LOOP);
            watchdog.check_all()
        };
        for component in &frozen {
            warn!(component = %component, "control loop missed its watchdog deadline");
        }
        report.frozen = frozen;

        if now.saturating_sub(self.last_heartbeat_ms) >= self.heartbeat_ms {
            self.last_heartbeat_ms = now;
            let status = self.status.snapshot();
            info!(
                state = %status.state,
                autonomy = status.navigation.autonomy_enabled,
                "heartbeat"
            );
            if self.bus.is_connected() {
                if let Err(e) = self.bus.publish(TelemetryFrame::status("heartbeat", now)) {
                    debug!(error = %e, "heartbeat frame not delivered");
                }
            }
            report.heartbeat_sent = true;
        }

        if now.saturating_sub(self.last_report_ms) >= self.status_report_ms {
            self.last_report_ms = now;
            info!(
                queued = self.intake.occupancy(),
                capacity = self.intake.capacity(),
                dropped = self.intake.dropped_count(),
                state = %self.status.state(),
                connected = self.bus.is_connected(),
                "status report"
            );
            report.status_logged = true;
        }

        report
    }

    pub fn run(mut self, shutdown: Arc<AtomicBool>) {
        info!("supervisor started");
        let mut cadence = Cadence::new(SUPERVISOR_LOOP, SUPERVISOR_TICK, self.clock.clone());
        while !shutdown.load(Ordering::Relaxed) {
            cadence.begin();
            self.step();
            cadence.finish();
        }
        info!("supervisor stopped");
    }
}
