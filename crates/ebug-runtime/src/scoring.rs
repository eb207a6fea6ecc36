//! Direction scoring.
//!
//! ```text
//! score = d · (1 − angle_penalty · |θ| / 90) · (recency_penalty if recent)
//! score = 0 if d < min_obstacle_cm
//! ```

use ebug_types::NavigationConfig;

/// Score a candidate direction `angle_deg` whose averaged distance is
/// `distance_cm`. Larger is better; 0 means unusable.
///
/// ```rust
/// use ebug_runtime::scoring::score_direction;
/// use ebug_types::NavigationConfig;
///
/// let cfg = NavigationConfig::default();
/// assert_eq!(score_direction(80.0, 0.0, false, &cfg), 80.0);
/// assert_eq!(score_direction(80.0, 90.0, false, &cfg), 40.0);
/// assert_eq!(score_direction(20.0, 0.0, false, &cfg), 0.0);
/// ```
pub fn score_direction(
    distance_cm: f32,
    angle_deg: f32,
    recently_visited: bool,
    cfg: &NavigationConfig,
) -> f32 {
    if distance_cm < cfg.min_obstacle_cm {
        return 0.0;
    }
    let base = distance_cm * (1.0 - cfg.angle_penalty * angle_deg.abs() / 90.0);
    if recently_visited {
        base * cfg.recency_penalty
    } else {
        base
    }
}

/// Mean of the samples below `sentinel`, or `None` if none are.
pub fn average_valid(samples: &[f32], sentinel: f32) -> Option<f32> {
    let (sum, count) = samples
        .iter()
        .filter(|&&s| s < sentinel)
        .fold((0.0f32, 0usize), |(sum, n), &s| (sum + s, n + 1));
    (count > 0).then(|| sum / count as f32)
}
