//! Percentage ↔ target conversion along the half-basal-target curve.
//!
//! With `c = hbt - 100` and sensitivity ratio `r`, the target is
//! `c / r - c + 100`. The curve has a pole at `r = 0` and collapses at
//! `c = 0`; inputs that land there fall back to the configured maximum ratio.

/// Default half-basal target (mg/dL)
pub const DEFAULT_HALF_BASAL_TARGET: f64 = 160.0;

/// Default percentage (no change in sensitivity)
pub const DEFAULT_PERCENTAGE: f64 = 100.0;

fn curve_target(c: f64, ratio: f64) -> f64 {
    (c / ratio) - c + 100.0
}

/// Target (mg/dL) for a sensitivity `percentage`.
///
/// Returns the exact value; callers round before building an entry.
pub fn compute_target(percentage: f64, half_basal_target: f64, max_ratio: f64) -> f64 {
    let c = half_basal_target - 100.0;
    let target = curve_target(c, percentage / 100.0);

    if !target.is_finite() || c * (c + target - 100.0) <= 0.0 {
        tracing::debug!(
            "Percentage {} is outside the curve for hbt {}, using max ratio {}",
            percentage,
            half_basal_target,
            max_ratio
        );
        return curve_target(c, max_ratio);
    }
    target
}

/// Sensitivity percentage for a target (mg/dL), clamped to `max_ratio` and
/// rounded half away from zero.
pub fn compute_percentage(target: f64, half_basal_target: f64, max_ratio: f64) -> f64 {
    let c = half_basal_target - 100.0;
    let mut ratio = c / (c + target - 100.0);

    if ratio.is_nan() || ratio > max_ratio {
        ratio = max_ratio;
    }

    (ratio * 100.0).round()
}
