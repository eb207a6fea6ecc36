//! [`DistanceProvider`] – the distance interface navigation and the motion
//! interlock consume.

/// Forward-facing distance source, shared between the sensing and motion
/// loops.
///
/// Every reading is in centimetres. Timeouts and out-of-range echoes never
/// surface as errors: they are reported as the configured max-range
/// sentinel, which callers treat as "no usable data".
pub trait DistanceProvider: Send + Sync {
    /// The most recent valid reading, without touching the sensor.
    fn current_distance(&self) -> f32;

    /// Take one fresh reading. A valid reading also becomes the new
    /// [`current_distance`][Self::current_distance].
    fn read_distance(&self) -> f32;

    /// Average `samples` fresh readings, discarding sentinel values.
    /// Returns the sentinel when no sample was valid.
    fn filtered_distance(&self, samples: usize) -> f32;

    /// The sentinel returned for unusable readings.
    fn max_distance(&self) -> f32;
}
