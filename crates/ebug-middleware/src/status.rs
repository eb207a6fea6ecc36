//! [`StatusBoard`] – the published [`RobotStatus`].
//!
//! Only the motion loop writes (it owns [`RobotState`] and the navigation
//! session). The supervisor and the CLI read.

use std::sync::Arc;

use ebug_types::{NavigationStats, RobotState, RobotStatus};
use tokio::sync::watch;

#[derive(Clone, Debug)]
pub struct StatusBoard {
    tx: Arc<watch::Sender<RobotStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RobotStatus::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn set_state(&self, state: RobotState) {
        self.tx.send_if_modified(|status| {
            let changed = status.state != state;
            status.state = state;
            changed
        });
    }

    pub fn set_navigation(&self, navigation: NavigationStats) {
        self.tx.send_if_modified(|status| {
            let changed = status.navigation != navigation;
            status.navigation = navigation;
            changed
        });
    }

    pub fn snapshot(&self) -> RobotStatus {
        *self.tx.borrow()
    }

    pub fn state(&self) -> RobotState {
        self.tx.borrow().state
    }

    pub fn subscribe(&self) -> watch::Receiver<RobotStatus> {
        self.tx.subscribe()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebug_types::NavPhase;

    #[test]
    fn clones_share_status() {
        let board = StatusBoard::new();
        let reader = board.clone();
        board.set_state(RobotState::Scanning);
        assert_eq!(reader.state(), RobotState::Scanning);
    }

    #[test]
    fn navigation_stats_are_published() {
        let board = StatusBoard::new();
        board.set_navigation(NavigationStats {
            autonomy_enabled: true,
            phase: NavPhase::Active,
            ..NavigationStats::default()
        });
        let status = board.snapshot();
        assert!(status.navigation.autonomy_enabled);
        assert_eq!(status.state, RobotState::Idle);
    }

    #[tokio::test]
    async fn subscribers_wake_on_change_only() {
        let board = StatusBoard::new();
        let mut rx = board.subscribe();
        board.set_state(RobotState::Idle);
        assert!(!rx.has_changed().unwrap());
        board.set_state(RobotState::Autonomous);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().state, RobotState::Autonomous);
    }
}
