//! Injected randomness for maneuver selection and jitter.
//!
//! The navigation engine never touches a global RNG. Production code uses
//! [`RngSource`]; tests use [`FixedSequence`] to force a particular
//! maneuver.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniformly distributed integers.
pub trait RandomSource: Send {
    /// A value in `[low, high)`. Returns `low` when the range is empty.
    fn next_in_range(&mut self, low: i32, high: i32) -> i32;
}

/// [`RandomSource`] backed by [`StdRng`].
pub struct RngSource {
    rng: StdRng,
}

impl RngSource {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible stream for a given `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for RngSource {
    fn next_in_range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }
}

/// Replays scripted values, clamped into the requested range. Falls back to
/// `low` once exhausted.
///
/// ```rust
/// use ebug_runtime::random::{FixedSequence, RandomSource};
///
/// let mut random = FixedSequence::new([2, 50]);
/// assert_eq!(random.next_in_range(0, 3), 2);
/// assert_eq!(random.next_in_range(-20, 20), 19);
/// assert_eq!(random.next_in_range(-20, 20), -20);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FixedSequence {
    values: VecDeque<i32>,
}

impl FixedSequence {
    pub fn new(values: impl IntoIterator<Item = i32>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl RandomSource for FixedSequence {
    fn next_in_range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        self.values
            .pop_front()
            .map_or(low, |v| v.clamp(low, high - 1))
    }
}
