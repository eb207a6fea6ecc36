//! [`PathMemory`] – short-term ring buffer of explored directions.
//!
//! Every scan sample is written to the next slot, overwriting the oldest
//! entry once the ring is full. Entries are never deleted; they simply stop
//! counting once older than the recency window.

use ebug_types::PathMemoryEntry;

/// Fixed-capacity circular store of [`PathMemoryEntry`] records.
///
/// # Example
///
/// ```rust
/// use ebug_runtime::path_memory::PathMemory;
///
/// let mut memory = PathMemory::new(10);
/// memory.record(-30.0, 80.0, 1_000);
/// assert!(memory.is_recently_visited(-20.0, 20.0, 30_000, 5_000));
/// assert!(!memory.is_recently_visited(-20.0, 20.0, 30_000, 40_000));
/// ```
#[derive(Debug, Clone)]
pub struct PathMemory {
    slots: Vec<Option<PathMemoryEntry>>,
    cursor: usize,
}

impl PathMemory {
    /// Create an empty memory with `capacity` slots (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            cursor: 0,
        }
    }

    /// Overwrite the current slot and advance the cursor.
    pub fn record(&mut self, angle_deg: f32, distance_cm: f32, now_ms: u64) {
        self.slots[self.cursor] = Some(PathMemoryEntry {
            angle_deg,
            distance_cm,
            timestamp_ms: now_ms,
        });
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// `true` if an entry lies strictly within `tolerance_deg` of
    /// `angle_deg` and is strictly younger than `window_ms`.
    pub fn is_recently_visited(
        &self,
        angle_deg: f32,
        tolerance_deg: f32,
        window_ms: u64,
        now_ms: u64,
    ) -> bool {
        self.entries().any(|e| {
            (e.angle_deg - angle_deg).abs() < tolerance_deg
                && now_ms.saturating_sub(e.timestamp_ms) < window_ms
        })
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.cursor = 0;
    }

    /// Number of written slots.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Written entries in slot order.
    pub fn entries(&self) -> impl Iterator<Item = &PathMemoryEntry> {
        self.slots.iter().flatten()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
