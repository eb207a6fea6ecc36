//! Scripted escape maneuvers.
//!
//! [`RecoveryManeuver`] runs after repeated blocked scans;
//! [`emergency_maneuver`] runs whenever something is closer than the
//! critical distance. Both draw their jitter from an injected
//! [`RandomSource`] so tests can pin the outcome.

use std::fmt;
use std::time::Duration;

use ebug_hal::{Clock, MotionExecutor};
use ebug_types::{NavigationConfig, RobotError};
use tracing::{info, warn};

use crate::random::RandomSource;

/// One of the three stuck-recovery patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryManeuver {
    /// Turn right 60–119° and drive 20 cm.
    SharpTurnAndAdvance,
    /// Back up 20 cm, then turn right 90–179°.
    BackUpAndWideTurn,
    /// Back up 10 cm, pause, then turn 180°.
    UTurn,
}

impl RecoveryManeuver {
    /// Choose uniformly among the three patterns.
    pub fn pick(random: &mut dyn RandomSource) -> Self {
        match random.next_in_range(0, 3) {
            0 => RecoveryManeuver::SharpTurnAndAdvance,
            1 => RecoveryManeuver::BackUpAndWideTurn,
            _ => RecoveryManeuver::UTurn,
        }
    }

    pub fn execute(
        self,
        motion: &mut dyn MotionExecutor,
        clock: &dyn Clock,
        random: &mut dyn RandomSource,
    ) -> Result<(), RobotError> {
        info!(maneuver = %self, "running stuck recovery");
        match self {
            RecoveryManeuver::SharpTurnAndAdvance => {
                let angle = 90 + random.next_in_range(-30, 30);
                motion.rotate(angle as f32)?;
                motion.move_forward(20.0)?;
            }
            RecoveryManeuver::BackUpAndWideTurn => {
                motion.move_backward(20.0)?;
                let angle = 135 + random.next_in_range(-45, 45);
                motion.rotate(angle as f32)?;
            }
            RecoveryManeuver::UTurn => {
                motion.move_backward(10.0)?;
                clock.sleep(Duration::from_millis(200));
                motion.rotate(180.0)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for RecoveryManeuver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecoveryManeuver::SharpTurnAndAdvance => "sharp_turn_and_advance",
            RecoveryManeuver::BackUpAndWideTurn => "back_up_and_wide_turn",
            RecoveryManeuver::UTurn => "u_turn",
        };
        f.write_str(name)
    }
}

/// Stop, back away and spin roughly around.
///
/// Returns the turn angle that was commanded.
pub fn emergency_maneuver(
    motion: &mut dyn MotionExecutor,
    clock: &dyn Clock,
    random: &mut dyn RandomSource,
    cfg: &NavigationConfig,
) -> Result<i32, RobotError> {
    warn!(backup_cm = cfg.emergency_backup_cm, "critical proximity, emergency maneuver");
    motion.stop()?;
    clock.sleep(Duration::from_millis(100));
    motion.move_backward(cfg.emergency_backup_cm)?;
    clock.sleep(Duration::from_millis(200));
    let jitter = cfg.emergency_jitter_deg;
    let angle = cfg.emergency_turn_deg + random.next_in_range(-jitter, jitter);
    motion.rotate(angle as f32)?;
    Ok(angle)
}

#[cfg(test)]
pub(crate) mod mock {
    use ebug_hal::{MotionExecutor, MotionOutcome};
    use ebug_types::RobotError;

    /// Motion primitive as recorded by [`MockMotion`].
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum Move {
        Forward(f32),
        Backward(f32),
        Rotate(f32),
        Stop,
        EmergencyStop,
    }

    /// Records every primitive and always completes.
    #[derive(Default)]
    pub struct MockMotion {
        pub moves: Vec<Move>,
        pub fail_next: Option<RobotError>,
        speed: u32,
    }

    impl MockMotion {
        fn outcome(&mut self, m: Move) -> Result<MotionOutcome, RobotError> {
            if let Some(e) = self.fail_next.take() {
                return Err(e);
            }
            self.moves.push(m);
            Ok(MotionOutcome::Completed { steps: 1 })
        }

        pub fn rotations(&self) -> Vec<f32> {
            self.moves
                .iter()
                .filter_map(|m| match m {
                    Move::Rotate(d) => Some(*d),
                    _ => None,
                })
                .collect()
        }
    }

    impl MotionExecutor for MockMotion {
        fn move_forward(&mut self, cm: f32) -> Result<MotionOutcome, RobotError> {
            self.outcome(Move::Forward(cm))
        }
        fn move_backward(&mut self, cm: f32) -> Result<MotionOutcome, RobotError> {
            self.outcome(Move::Backward(cm))
        }
        fn rotate(&mut self, degrees: f32) -> Result<MotionOutcome, RobotError> {
            self.outcome(Move::Rotate(degrees))
        }
        fn stop(&mut self) -> Result<(), RobotError> {
            self.moves.push(Move::Stop);
            Ok(())
        }
        fn emergency_stop(&mut self) -> Result<(), RobotError> {
            self.moves.push(Move::EmergencyStop);
            Ok(())
        }
        fn set_speed(&mut self, half_period_us: u32) -> Result<(), RobotError> {
            self.speed = half_period_us;
            Ok(())
        }
        fn speed(&self) -> u32 {
            self.speed
        }
    }
}
