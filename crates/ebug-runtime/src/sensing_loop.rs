//! [`SensingLoop`] – heading integration and periodic snapshots.
//!
//! Runs at the IMU cadence so heading integration never starves, and only
//! every `sensor_update_ms` takes a full [`SensorSnapshot`], publishes it to
//! the snapshot cell and, when an operator is listening, sends it out as a
//! sensor frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ebug_hal::Clock;
use ebug_kernel::Watchdog;
use ebug_middleware::{SnapshotPublisher, TelemetryBus};
use ebug_perception::SensorHub;
use ebug_types::{SensorSnapshot, TelemetryFrame};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cadence::Cadence;

/// Watchdog id of the sensing loop.
pub const SENSING_LOOP: &str = "sensing";

pub struct SensingLoop {
    hub: Arc<SensorHub>,
    publisher: SnapshotPublisher,
    bus: TelemetryBus,
    clock: Arc<dyn Clock>,
    tick: Duration,
    snapshot_every_ms: u64,
    last_snapshot_ms: Option<u64>,
}

impl SensingLoop {
    pub fn new(
        hub: Arc<SensorHub>,
        publisher: SnapshotPublisher,
        bus: TelemetryBus,
        clock: Arc<dyn Clock>,
        tick: Duration,
        snapshot_every: Duration,
    ) -> Self {
        Self {
            hub,
            publisher,
            bus,
            clock,
            tick,
            snapshot_every_ms: snapshot_every.as_millis() as u64,
            last_snapshot_ms: None,
        }
    }

    /// Integrate the heading and, when due, publish a snapshot.
    pub fn step(&mut self) -> Option<SensorSnapshot> {
        self.hub.update_heading();

        let now = self.clock.now_ms();
        let due = self
            .last_snapshot_ms
            .is_none_or(|last| now.saturating_sub(last) >= self.snapshot_every_ms);
        if !due {
            return None;
        }
        self.last_snapshot_ms = Some(now);

        let snapshot = self.hub.snapshot();
        self.publisher.publish(snapshot);
        if self.bus.is_connected() {
            if let Err(e) = self.bus.publish(TelemetryFrame::Sensor(snapshot.into())) {
                debug!(error = %e, "sensor frame not delivered");
            }
        }
        Some(snapshot)
    }

    pub fn run(mut self, shutdown: Arc<AtomicBool>, watchdog: Arc<Mutex<Watchdog>>) {
        info!(
            tick_ms = self.tick.as_millis() as u64,
            snapshot_ms = self.snapshot_every_ms,
            "sensing loop started"
        );
        let mut cadence = Cadence::new(SENSING_LOOP, self.tick, self.clock.clone());
        while !shutdown.load(Ordering::Relaxed) {
            cadence.begin();
            self.step();
            watchdog.lock().heartbeat(SENSING_LOOP);
            cadence.finish();
        }
        info!("sensing loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebug_hal::VirtualClock;
    use ebug_hal::sim::SimRig;
    use ebug_middleware::snapshot_cell;
    use ebug_types::SensorConfig;

    fn sensing() -> (SensingLoop, ebug_middleware::SnapshotReader, TelemetryBus, VirtualClock) {
        let clock = VirtualClock::new();
        let rig = SimRig::new(Arc::new(clock.clone()))
            .with_obstacle(0.0, 100.0, 10.0)
            .build();
        let hub = SensorHub::new(
            SensorConfig::default(),
            10,
            Arc::new(clock.clone()),
            Box::new(rig.rangefinder),
            Box::new(rig.imu),
            Box::new(rig.battery),
        );
        let (publisher, reader) = snapshot_cell();
        let bus = TelemetryBus::default();
        let sensing = SensingLoop::new(
            Arc::new(hub),
            publisher,
            bus.clone(),
            Arc::new(clock.clone()),
            Duration::from_millis(10),
            Duration::from_millis(1000),
        );
        (sensing, reader, bus, clock)
    }

    #[test]
    fn first_step_publishes_a_snapshot() {
        let (mut sensing, reader, _bus, _clock) = sensing();
        let snap = sensing.step().expect("first step is always due");
        assert!((snap.distance_cm - 90.0).abs() < 0.5);
        assert_eq!(reader.latest(), snap);
        assert_eq!(snap.battery_pct, 100.0);
    }

    #[test]
    fn snapshots_follow_the_slow_cadence() {
        let (mut sensing, _reader, _bus, clock) = sensing();
        assert!(sensing.step().is_some());
        clock.advance(Duration::from_millis(10));
        assert!(sensing.step().is_none());
        clock.advance(Duration::from_millis(990));
        let snap = sensing.step().expect("due after a full interval");
        assert_eq!(snap.timestamp_ms, 1000);
    }

    #[test]
    fn connected_operator_receives_sensor_frames() {
        let (mut sensing, _reader, bus, _clock) = sensing();
        let mut rx = bus.subscribe();
        sensing.step();
        match rx.try_recv() {
            Some(TelemetryFrame::Sensor(t)) => assert!((t.distance - 90.0).abs() < 0.5),
            other => panic!("expected a sensor frame, got {other:?}"),
        }
    }
}
