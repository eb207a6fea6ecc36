//! [`NavigationEngine`] – scan, score, decide and recover.
//!
//! The engine is owned by the motion loop and driven through
//! [`tick`][NavigationEngine::tick]. Each tick that is not rate limited
//! makes exactly one decision:
//!
//! ```text
//! d < critical          → emergency maneuver
//! d > 2 × min_obstacle  → advance a small step
//! otherwise             → sweep, score, turn to the best angle
//!                         (or count a failure and eventually recover)
//! ```
//!
//! # Phases
//!
//! `Idle → Active ↔ Scanning → Recovering → Active`, with `Emergency` as a
//! transient detour from any active phase. Only
//! [`disable_autonomy`][NavigationEngine::disable_autonomy] or
//! [`deactivate`][NavigationEngine::deactivate] returns to `Idle`.

use std::sync::Arc;
use std::time::Duration;

use ebug_hal::{Clock, DistanceProvider, MotionExecutor, MotionOutcome};
use ebug_middleware::StatusBoard;
use ebug_types::{NavPhase, NavigationConfig, NavigationStats, RobotError, RobotState};
use tracing::{debug, info, warn};

use crate::maneuvers::{RecoveryManeuver, emergency_maneuver};
use crate::path_memory::PathMemory;
use crate::random::RandomSource;
use crate::scoring::{average_valid, score_direction};
use crate::stuck::StuckDetector;

// ─────────────────────────────────────────────────────────────────────────────
// Session and results
// ─────────────────────────────────────────────────────────────────────────────

/// Per-autonomy-run state. Reset whenever autonomy is switched on or off.
#[derive(Debug, Clone)]
pub struct NavigationSession {
    pub autonomy_enabled: bool,
    pub stuck: StuckDetector,
    pub last_update_ms: u64,
    pub last_chosen_angle_deg: f32,
}

impl NavigationSession {
    fn new(stuck_threshold: u32) -> Self {
        Self {
            autonomy_enabled: false,
            stuck: StuckDetector::new(stuck_threshold),
            last_update_ms: 0,
            last_chosen_angle_deg: 0.0,
        }
    }
}

/// What a single [`NavigationEngine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Autonomy is off.
    Disabled,
    /// Called again before `tick_interval_ms` elapsed; nothing happened.
    RateLimited,
    /// Critical proximity; backed up and spun by `turn_deg`.
    Emergency { turn_deg: i32 },
    /// The path ahead was clear and the robot stepped forward.
    Advanced(MotionOutcome),
    /// A sweep found a usable direction and the robot turned to it.
    Turned { angle_deg: i32 },
    /// A sweep found nothing usable; `stuck` consecutive failures so far.
    Blocked { stuck: u32 },
    /// The failure streak hit the threshold and a maneuver ran.
    Recovered(RecoveryManeuver),
}

/// One angle of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleSample {
    pub angle_deg: i32,
    pub distance_cm: f32,
    pub score: f32,
}

/// Result of [`NavigationEngine::find_best_path`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Angles that produced at least one valid reading, in sweep order.
    pub samples: Vec<AngleSample>,
    /// Highest-scoring angle, or `None` when every direction is blocked.
    pub best: Option<i32>,
    /// A reading below `critical_distance_cm` cut the sweep short.
    pub critical: Option<CriticalReading>,
}

/// The reading that aborted a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalReading {
    pub angle_deg: i32,
    pub distance_cm: f32,
}

// ─────────────────────────────────────────────────────────────────────────────
// NavigationEngine
// ─────────────────────────────────────────────────────────────────────────────

pub struct NavigationEngine {
    config: NavigationConfig,
    distance: Arc<dyn DistanceProvider>,
    clock: Arc<dyn Clock>,
    random: Box<dyn RandomSource>,
    memory: PathMemory,
    session: NavigationSession,
    phase: NavPhase,
    status: Option<StatusBoard>,
}

impl NavigationEngine {
    /// `config` is expected to have passed [`RobotConfig::validate`]; the
    /// sweep step and sample count are still forced to at least 1.
    ///
    /// [`RobotConfig::validate`]: ebug_types::RobotConfig::validate
    pub fn new(
        mut config: NavigationConfig,
        distance: Arc<dyn DistanceProvider>,
        clock: Arc<dyn Clock>,
        random: Box<dyn RandomSource>,
    ) -> Self {
        config.scan_step_deg = config.scan_step_deg.max(1);
        config.samples_per_angle = config.samples_per_angle.max(1);
        Self {
            memory: PathMemory::new(config.path_memory_size),
            session: NavigationSession::new(config.stuck_threshold),
            config,
            distance,
            clock,
            random,
            phase: NavPhase::Idle,
            status: None,
        }
    }

    /// Report `Scanning` on `board` while a sweep is running.
    pub fn with_status_board(mut self, board: StatusBoard) -> Self {
        self.status = Some(board);
        self
    }

    // ── Autonomy ─────────────────────────────────────────────────────────────

    /// Start a fresh autonomy run. The first decision happens one tick
    /// interval from now.
    pub fn enable_autonomy(&mut self) {
        self.session = NavigationSession::new(self.config.stuck_threshold);
        self.session.autonomy_enabled = true;
        self.session.last_update_ms = self.clock.now_ms();
        self.memory.clear();
        self.phase = NavPhase::Active;
        info!("autonomous navigation enabled");
    }

    /// Leave autonomy and stop the motors.
    pub fn disable_autonomy(&mut self, motion: &mut dyn MotionExecutor) -> Result<(), RobotError> {
        let was_enabled = self.session.autonomy_enabled;
        self.deactivate();
        if was_enabled {
            info!("autonomous navigation disabled");
        }
        motion.stop()
    }

    /// Reset the session and path memory without touching the motors.
    pub fn deactivate(&mut self) {
        self.session = NavigationSession::new(self.config.stuck_threshold);
        self.memory.clear();
        self.phase = NavPhase::Idle;
    }

    pub fn is_autonomous(&self) -> bool {
        self.session.autonomy_enabled
    }

    pub fn phase(&self) -> NavPhase {
        self.phase
    }

    pub fn path_memory(&self) -> &PathMemory {
        &self.memory
    }

    pub fn stats(&self) -> NavigationStats {
        NavigationStats {
            autonomy_enabled: self.session.autonomy_enabled,
            phase: self.phase,
            stuck_counter: self.session.stuck.count(),
            last_chosen_angle_deg: self.session.last_chosen_angle_deg,
            path_memory_entries: self.memory.occupied(),
        }
    }

    /// Zero the failure streak and the last chosen angle.
    pub fn reset_stats(&mut self) {
        self.session.stuck.reset();
        self.session.last_chosen_angle_deg = 0.0;
    }

    // ── Decision tick ────────────────────────────────────────────────────────

    /// Make at most one navigation decision.
    pub fn tick(&mut self, motion: &mut dyn MotionExecutor) -> Result<TickOutcome, RobotError> {
        if !self.session.autonomy_enabled {
            return Ok(TickOutcome::Disabled);
        }
        let now = self.clock.now_ms();
        if now.saturating_sub(self.session.last_update_ms) < self.config.tick_interval_ms {
            return Ok(TickOutcome::RateLimited);
        }
        self.session.last_update_ms = now;

        let distance = self.distance.read_distance();
        if distance < self.config.critical_distance_cm {
            return self.emergency(motion, distance);
        }

        if distance > 2.0 * self.config.min_obstacle_cm {
            let outcome = motion.move_forward(self.config.advance_step_cm)?;
            self.session.stuck.reset();
            debug!(distance_cm = distance, ?outcome, "path clear, advancing");
            return Ok(TickOutcome::Advanced(outcome));
        }

        let report = self.find_best_path(motion)?;
        if let Some(hit) = report.critical {
            return self.emergency(motion, hit.distance_cm);
        }

        // The sweep takes seconds; something may have moved in meanwhile.
        let distance = self.distance.read_distance();
        if distance < self.config.critical_distance_cm {
            return self.emergency(motion, distance);
        }

        match report.best {
            Some(angle) => {
                motion.rotate(angle as f32)?;
                self.session.last_chosen_angle_deg = angle as f32;
                self.session.stuck.reset();
                info!(angle_deg = angle, "turning to best direction");
                Ok(TickOutcome::Turned { angle_deg: angle })
            }
            None => {
                let stuck = self.session.stuck.record_failure();
                let count = self.session.stuck.count();
                info!(stuck_counter = count, "no usable direction");
                if !stuck {
                    return Ok(TickOutcome::Blocked { stuck: count });
                }
                self.phase = NavPhase::Recovering;
                let maneuver = RecoveryManeuver::pick(self.random.as_mut());
                maneuver.execute(motion, self.clock.as_ref(), self.random.as_mut())?;
                self.memory.clear();
                self.session.stuck.reset();
                self.phase = NavPhase::Active;
                Ok(TickOutcome::Recovered(maneuver))
            }
        }
    }

    fn emergency(
        &mut self,
        motion: &mut dyn MotionExecutor,
        distance_cm: f32,
    ) -> Result<TickOutcome, RobotError> {
        debug!(distance_cm, "critical distance");
        self.phase = NavPhase::Emergency;
        self.session.stuck.reset();
        let turn_deg =
            emergency_maneuver(motion, self.clock.as_ref(), self.random.as_mut(), &self.config)?;
        self.phase = NavPhase::Active;
        Ok(TickOutcome::Emergency { turn_deg })
    }

    // ── Sweeps ───────────────────────────────────────────────────────────────

    /// Sweep the scan window, score every angle and return to the starting
    /// heading.
    ///
    /// Scores are computed against path memory as it stood before the sweep;
    /// the sweep's own samples are recorded once it completes. Any single
    /// reading below `critical_distance_cm` ends the sweep at once and is
    /// returned in [`ScanReport::critical`].
    pub fn find_best_path(&mut self, motion: &mut dyn MotionExecutor) -> Result<ScanReport, RobotError> {
        self.phase = NavPhase::Scanning;
        if let Some(board) = &self.status {
            board.set_state(RobotState::Scanning);
        }

        let cfg = &self.config;
        let sentinel = self.distance.max_distance();
        let mut report = ScanReport::default();
        let mut best_score = 0.0f32;
        let mut offset = 0;

        'sweep: for angle in (cfg.scan_start_deg..=cfg.scan_end_deg).step_by(cfg.scan_step_deg as usize) {
            motion.rotate((angle - offset) as f32)?;
            offset = angle;
            self.clock.sleep(Duration::from_millis(cfg.stabilization_ms));

            let mut readings = Vec::with_capacity(cfg.samples_per_angle);
            for _ in 0..cfg.samples_per_angle {
                let reading = self.distance.read_distance();
                if reading < cfg.critical_distance_cm {
                    warn!(angle_deg = angle, distance_cm = reading, "critical reading, aborting sweep");
                    report.critical = Some(CriticalReading {
                        angle_deg: angle,
                        distance_cm: reading,
                    });
                    break 'sweep;
                }
                readings.push(reading);
                self.clock.sleep(Duration::from_millis(cfg.sample_interval_ms));
            }
            let Some(distance_cm) = average_valid(&readings, sentinel) else {
                debug!(angle_deg = angle, "no valid echo, skipping angle");
                continue;
            };

            let recent = self.memory.is_recently_visited(
                angle as f32,
                cfg.recency_tolerance_deg,
                cfg.recency_window_ms,
                self.clock.now_ms(),
            );
            let score = score_direction(distance_cm, angle as f32, recent, cfg);
            debug!(angle_deg = angle, distance_cm, recent, score, "scan sample");

            if score > best_score {
                best_score = score;
                report.best = Some(angle);
            }
            report.samples.push(AngleSample {
                angle_deg: angle,
                distance_cm,
                score,
            });
        }

        if offset != 0 {
            motion.rotate(-offset as f32)?;
        }

        let now = self.clock.now_ms();
        for sample in &report.samples {
            self.memory.record(sample.angle_deg as f32, sample.distance_cm, now);
        }

        self.phase = NavPhase::Active;
        if let Some(board) = &self.status {
            board.set_state(RobotState::Autonomous);
        }
        info!(best = ?report.best, best_score, samples = report.samples.len(), "scan complete");
        Ok(report)
    }

    /// Look left, ahead and right (±45°). `true` when all three are closer
    /// than `min_obstacle_cm`.
    pub fn detect_dead_end(&mut self, motion: &mut dyn MotionExecutor) -> Result<bool, RobotError> {
        let settle = Duration::from_millis(100);
        let center = self.distance.filtered_distance(2);
        motion.rotate(-45.0)?;
        self.clock.sleep(settle);
        let left = self.distance.filtered_distance(2);
        motion.rotate(90.0)?;
        self.clock.sleep(settle);
        let right = self.distance.filtered_distance(2);
        motion.rotate(-45.0)?;

        let min = self.config.min_obstacle_cm;
        let dead_end = left < min && center < min && right < min;
        info!(left, center, right, dead_end, "dead-end check");
        Ok(dead_end)
    }

    /// Wide −90°…+90° survey in 30° steps. Returns `(angle, distance)` pairs
    /// and leaves the robot facing its original heading.
    pub fn perimeter_scan(&mut self, motion: &mut dyn MotionExecutor) -> Result<Vec<(i32, f32)>, RobotError> {
        let mut readings = Vec::with_capacity(7);
        let mut offset = 0;
        for angle in (-90..=90).step_by(30) {
            motion.rotate((angle - offset) as f32)?;
            offset = angle;
            self.clock.sleep(Duration::from_millis(200));
            readings.push((angle, self.distance.filtered_distance(2)));
        }
        motion.rotate(-offset as f32)?;
        debug!(?readings, "perimeter scan");
        Ok(readings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod scripted {
    use std::collections::VecDeque;

    use ebug_hal::DistanceProvider;
    use parking_lot::Mutex;

    /// Replays a fixed list of readings, then repeats `fallback`.
    pub struct ScriptedDistance {
        readings: Mutex<VecDeque<f32>>,
        last: Mutex<f32>,
        fallback: f32,
    }

    impl ScriptedDistance {
        pub fn new(readings: impl IntoIterator<Item = f32>, fallback: f32) -> Self {
            Self {
                readings: Mutex::new(readings.into_iter().collect()),
                last: Mutex::new(fallback),
                fallback,
            }
        }

        pub fn constant(cm: f32) -> Self {
            Self::new([], cm)
        }
    }

    impl DistanceProvider for ScriptedDistance {
        fn current_distance(&self) -> f32 {
            *self.last.lock()
        }

        fn read_distance(&self) -> f32 {
            let d = self.readings.lock().pop_front().unwrap_or(self.fallback);
            *self.last.lock() = d;
            d
        }

        fn filtered_distance(&self, samples: usize) -> f32 {
            let readings: Vec<f32> = (0..samples).map(|_| self.read_distance()).collect();
            crate::scoring::average_valid(&readings, 999.0).unwrap_or(999.0)
        }

        fn max_distance(&self) -> f32 {
            999.0
        }
    }

    /// Three readings per angle of the default −60…60 window.
    pub fn sweep(f: impl Fn(i32) -> f32) -> Vec<f32> {
        (-60..=60)
            .step_by(10)
            .flat_map(|angle| [f(angle); 3])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::scripted::{ScriptedDistance, sweep};
    use super::*;
    use crate::maneuvers::mock::{MockMotion, Move};
    use crate::random::FixedSequence;
    use ebug_hal::VirtualClock;

    fn engine(distance: ScriptedDistance, random: FixedSequence) -> (NavigationEngine, VirtualClock) {
        let clock = VirtualClock::new();
        let engine = NavigationEngine::new(
            NavigationConfig::default(),
            Arc::new(distance),
            Arc::new(clock.clone()),
            Box::new(random),
        );
        (engine, clock)
    }

    fn armed(distance: ScriptedDistance, random: FixedSequence) -> (NavigationEngine, VirtualClock) {
        let (mut engine, clock) = engine(distance, random);
        engine.enable_autonomy();
        clock.advance(Duration::from_millis(500));
        (engine, clock)
    }

    #[test]
    fn disabled_engine_does_nothing() {
        let (mut engine, _clock) = engine(ScriptedDistance::constant(10.0), FixedSequence::default());
        let mut motion = MockMotion::default();
        assert_eq!(engine.tick(&mut motion).unwrap(), TickOutcome::Disabled);
        assert!(motion.moves.is_empty());
        assert_eq!(engine.phase(), NavPhase::Idle);
    }

    #[test]
    fn ticks_inside_the_interval_are_noops() {
        let (mut engine, clock) = engine(ScriptedDistance::constant(60.0), FixedSequence::default());
        let mut motion = MockMotion::default();
        engine.enable_autonomy();
        assert_eq!(engine.tick(&mut motion).unwrap(), TickOutcome::RateLimited);
        clock.advance(Duration::from_millis(499));
        assert_eq!(engine.tick(&mut motion).unwrap(), TickOutcome::RateLimited);
        clock.advance(Duration::from_millis(1));
        assert!(matches!(engine.tick(&mut motion).unwrap(), TickOutcome::Advanced(_)));
        assert_eq!(engine.tick(&mut motion).unwrap(), TickOutcome::RateLimited);
    }

    #[test]
    fn clear_path_advances_one_step() {
        let (mut engine, _clock) = armed(ScriptedDistance::constant(51.0), FixedSequence::default());
        let mut motion = MockMotion::default();
        engine.tick(&mut motion).unwrap();
        assert_eq!(motion.moves, vec![Move::Forward(10.0)]);
        assert_eq!(engine.path_memory().occupied(), 0);
    }

    #[test]
    fn ambiguous_range_selects_open_straight_ahead() {
        let mut script = vec![30.0];
        script.extend(sweep(|a| match a {
            0 => 80.0,
            -60 | 60 => 18.0,
            _ => 20.0,
        }));
        script.push(30.0);
        let distance = ScriptedDistance::new(script, 999.0);
        let (mut engine, _clock) = armed(distance, FixedSequence::default());
        let mut motion = MockMotion::default();

        let outcome = engine.tick(&mut motion).unwrap();

        assert_eq!(outcome, TickOutcome::Turned { angle_deg: 0 });
        let mut expected = vec![-60.0];
        expected.extend([10.0; 12]);
        expected.extend([-60.0, 0.0]);
        assert_eq!(motion.rotations(), expected);
        assert_eq!(engine.phase(), NavPhase::Active);
        // 13 samples through a 10-slot ring.
        assert_eq!(engine.path_memory().occupied(), 10);
    }

    #[test]
    fn every_sweep_blocked_recovers_on_the_third() {
        let (mut engine, clock) = armed(ScriptedDistance::constant(20.0), FixedSequence::new([2]));
        let mut motion = MockMotion::default();

        assert_eq!(engine.tick(&mut motion).unwrap(), TickOutcome::Blocked { stuck: 1 });
        assert_eq!(engine.stats().stuck_counter, 1);
        clock.advance(Duration::from_millis(500));
        assert_eq!(engine.tick(&mut motion).unwrap(), TickOutcome::Blocked { stuck: 2 });
        clock.advance(Duration::from_millis(500));
        assert_eq!(
            engine.tick(&mut motion).unwrap(),
            TickOutcome::Recovered(RecoveryManeuver::UTurn)
        );

        let stats = engine.stats();
        assert_eq!(stats.stuck_counter, 0);
        assert_eq!(stats.path_memory_entries, 0);
        assert_eq!(stats.phase, NavPhase::Active);
        assert_eq!(motion.moves[motion.moves.len() - 2..], [Move::Backward(10.0), Move::Rotate(180.0)]);
    }

    #[test]
    fn unreadable_angles_are_skipped_not_scored() {
        let (mut engine, _clock) = engine(
            ScriptedDistance::new(sweep(|a| if a == 30 { 70.0 } else { 999.0 }), 999.0),
            FixedSequence::default(),
        );
        let mut motion = MockMotion::default();
        let report = engine.find_best_path(&mut motion).unwrap();
        assert_eq!(report.samples.len(), 1);
        assert_eq!(report.best, Some(30));
        assert_eq!(engine.path_memory().occupied(), 1);
    }

    #[test]
    fn recently_explored_direction_loses_to_a_fresh_one() {
        let mut script = vec![30.0];
        script.extend(sweep(|a| match a {
            0 => 80.0,
            40 => 60.0,
            _ => 20.0,
        }));
        script.push(30.0);
        let (mut engine, clock) = armed(ScriptedDistance::new(script, 999.0), FixedSequence::default());
        engine.memory.record(0.0, 80.0, clock.now_ms());
        let mut motion = MockMotion::default();

        assert_eq!(engine.tick(&mut motion).unwrap(), TickOutcome::Turned { angle_deg: 40 });
        assert_eq!(engine.stats().last_chosen_angle_deg, 40.0);
    }

    #[test]
    fn critical_reading_triggers_emergency_then_resumes() {
        let (mut engine, _clock) = armed(ScriptedDistance::constant(10.0), FixedSequence::new([5]));
        let mut motion = MockMotion::default();

        assert_eq!(engine.tick(&mut motion).unwrap(), TickOutcome::Emergency { turn_deg: 165 });
        assert_eq!(
            motion.moves,
            vec![Move::Stop, Move::Backward(15.0), Move::Rotate(165.0)]
        );
        assert_eq!(engine.phase(), NavPhase::Active);
        assert!(engine.is_autonomous());
    }

    #[test]
    fn critical_reading_after_sweep_preempts_the_turn() {
        let mut script = vec![30.0];
        script.extend(sweep(|a| if a == 0 { 80.0 } else { 20.0 }));
        script.push(10.0);
        let distance = ScriptedDistance::new(script, 999.0);
        let (mut engine, _clock) = armed(distance, FixedSequence::new([0]));
        let mut motion = MockMotion::default();

        assert_eq!(engine.tick(&mut motion).unwrap(), TickOutcome::Emergency { turn_deg: 160 });
        assert_eq!(engine.stats().last_chosen_angle_deg, 0.0);
        assert_eq!(motion.moves.last(), Some(&Move::Rotate(160.0)));
    }

    #[test]
    fn critical_reading_mid_sweep_aborts_into_emergency() {
        let mut script = vec![30.0];
        script.extend(sweep(|a| if a == -30 { 10.0 } else { 20.0 }));
        script.push(30.0);
        let (mut engine, _clock) = armed(ScriptedDistance::new(script, 999.0), FixedSequence::new([0]));
        let mut motion = MockMotion::default();

        assert_eq!(engine.tick(&mut motion).unwrap(), TickOutcome::Emergency { turn_deg: 160 });
        // Three angles swept, back to the origin heading, then the escape turn.
        assert_eq!(motion.rotations(), vec![-60.0, 10.0, 10.0, 10.0, 30.0, 160.0]);
        assert!(motion.moves.contains(&Move::Backward(15.0)));
        let stats = engine.stats();
        assert_eq!(stats.stuck_counter, 0);
        assert_eq!(stats.phase, NavPhase::Active);
        assert_eq!(stats.path_memory_entries, 3);
    }

    #[test]
    fn aborted_sweep_reports_the_critical_reading() {
        let (mut engine, _clock) = engine(
            ScriptedDistance::new(sweep(|a| if a == 20 { 12.0 } else { 40.0 }), 999.0),
            FixedSequence::default(),
        );
        let mut motion = MockMotion::default();
        let report = engine.find_best_path(&mut motion).unwrap();
        assert_eq!(
            report.critical,
            Some(CriticalReading {
                angle_deg: 20,
                distance_cm: 12.0
            })
        );
        assert_eq!(report.samples.len(), 8);
        assert_eq!(motion.rotations().iter().sum::<f32>(), 0.0);
    }

    #[test]
    fn zero_scan_step_is_raised_to_one_degree() {
        let clock = VirtualClock::new();
        let config = NavigationConfig {
            scan_step_deg: 0,
            scan_start_deg: -2,
            scan_end_deg: 2,
            ..NavigationConfig::default()
        };
        let mut engine = NavigationEngine::new(
            config,
            Arc::new(ScriptedDistance::constant(60.0)),
            Arc::new(clock),
            Box::new(FixedSequence::default()),
        );
        let report = engine.find_best_path(&mut MockMotion::default()).unwrap();
        let angles: Vec<i32> = report.samples.iter().map(|s| s.angle_deg).collect();
        assert_eq!(angles, vec![-2, -1, 0, 1, 2]);
    }

    #[test]
    fn enable_then_disable_resets_session_and_memory() {
        let mut script = vec![30.0];
        script.extend(sweep(|a| if a == 20 { 80.0 } else { 20.0 }));
        script.push(30.0);
        let (mut engine, _clock) = armed(ScriptedDistance::new(script, 30.0), FixedSequence::default());
        let mut motion = MockMotion::default();
        assert_eq!(engine.tick(&mut motion).unwrap(), TickOutcome::Turned { angle_deg: 20 });
        assert!(engine.stats().path_memory_entries > 0);

        engine.disable_autonomy(&mut motion).unwrap();

        let stats = engine.stats();
        assert!(!stats.autonomy_enabled);
        assert_eq!(stats.stuck_counter, 0);
        assert_eq!(stats.last_chosen_angle_deg, 0.0);
        assert_eq!(stats.path_memory_entries, 0);
        assert_eq!(stats.phase, NavPhase::Idle);
        assert_eq!(motion.moves.last(), Some(&Move::Stop));
    }

    #[test]
    fn scan_reports_through_status_board() {
        let board = StatusBoard::new();
        let (engine, _clock) = engine(ScriptedDistance::constant(999.0), FixedSequence::default());
        let mut engine = engine.with_status_board(board.clone());
        let mut rx = board.subscribe();
        engine.find_best_path(&mut MockMotion::default()).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(board.state(), RobotState::Autonomous);
    }

    #[test]
    fn dead_end_needs_all_three_blocked() {
        let (mut engine, _clock) = engine(
            ScriptedDistance::new([10.0, 10.0, 12.0, 12.0, 8.0, 8.0], 999.0),
            FixedSequence::default(),
        );
        let mut motion = MockMotion::default();
        assert!(engine.detect_dead_end(&mut motion).unwrap());
        assert_eq!(motion.rotations(), vec![-45.0, 90.0, -45.0]);
        assert!(!engine.detect_dead_end(&mut motion).unwrap());
    }

    #[test]
    fn perimeter_scan_returns_to_origin() {
        let distance = ScriptedDistance::constant(120.0);
        let (mut engine, _clock) = engine(distance, FixedSequence::default());
        let mut motion = MockMotion::default();
        let readings = engine.perimeter_scan(&mut motion).unwrap();
        let angles: Vec<i32> = readings.iter().map(|(a, _)| *a).collect();
        assert_eq!(angles, vec![-90, -60, -30, 0, 30, 60, 90]);
        assert!(readings.iter().all(|(_, d)| *d == 120.0));
        assert_eq!(motion.rotations().iter().sum::<f32>(), 0.0);
    }
}
