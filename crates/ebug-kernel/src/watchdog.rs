//! [`Watchdog`] – control-loop liveness monitor.
//!
//! The motion, sensing and supervisor loops each call
//! [`Watchdog::heartbeat`] once per iteration. A loop is *frozen* when its
//! last heartbeat is older than its timeout. Time comes from a
//! [`Clock`], so tests drive it with a virtual clock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ebug_hal::clock::Clock;

/// Health state reported for a single loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentHealth {
    Healthy,
    TimedOut,
}

struct ComponentEntry {
    last_heartbeat_us: u64,
    timeout: Duration,
}

/// Tracks heartbeats from registered loops and detects frozen ones.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use ebug_hal::clock::VirtualClock;
/// use ebug_kernel::watchdog::{ComponentHealth, Watchdog};
///
/// let clock = VirtualClock::new();
/// let mut wd = Watchdog::new(Arc::new(clock.clone()));
/// wd.register("motion", Duration::from_secs(1));
/// clock.advance(Duration::from_secs(2));
/// assert_eq!(wd.health("motion"), ComponentHealth::TimedOut);
/// ```
pub struct Watchdog {
    clock: Arc<dyn Clock>,
    components: HashMap<String, ComponentEntry>,
}

impl Watchdog {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            components: HashMap::new(),
        }
    }

    /// Register `component_id` with a maximum heartbeat `timeout`.
    ///
    /// Starts healthy. Re-registering resets the deadline.
    pub fn register(&mut self, component_id: &str, timeout: Duration) {
        self.components.insert(
            component_id.to_string(),
            ComponentEntry {
                last_heartbeat_us: self.clock.now_us(),
                timeout,
            },
        );
    }

    /// Record a heartbeat. No-op for unregistered components.
    pub fn heartbeat(&mut self, component_id: &str) {
        let now = self.clock.now_us();
        if let Some(entry) = self.components.get_mut(component_id) {
            entry.last_heartbeat_us = now;
        }
    }

    /// Unknown components report [`ComponentHealth::TimedOut`].
    pub fn health(&self, component_id: &str) -> ComponentHealth {
        match self.components.get(component_id) {
            Some(entry) if !self.expired(entry) => ComponentHealth::Healthy,
            _ => ComponentHealth::TimedOut,
        }
    }

    /// IDs of every component past its deadline, sorted.
    pub fn check_all(&self) -> Vec<String> {
        let mut frozen: Vec<String> = self
            .components
            .iter()
            .filter(|(_, entry)| self.expired(entry))
            .map(|(id, _)| id.clone())
            .collect();
        frozen.sort();
        frozen
    }

    fn expired(&self, entry: &ComponentEntry) -> bool {
        let elapsed = self.clock.now_us().saturating_sub(entry.last_heartbeat_us);
        elapsed > entry.timeout.as_micros() as u64
    }
}
