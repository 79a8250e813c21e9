//! Chronological Scorer
//!
//! Weights a match by its relative position in the log: earlier is more
//! suspicious than later, with a flat-ish middle band.

/// Tunables for chronological scoring.
#[derive(Debug, Clone, Copy)]
pub struct ChronologicalConfig {
    /// `E`: below this relative position, the early bonus applies.
    pub early_threshold: f64,
    /// `M`: the factor at position 0.
    pub max_early_bonus: f64,
    /// `T`: at/after this relative position, the late penalty applies.
    pub penalty_threshold: f64,
}

impl Default for ChronologicalConfig {
    fn default() -> Self {
        ChronologicalConfig {
            early_threshold: 0.2,
            max_early_bonus: 2.5,
            penalty_threshold: 0.5,
        }
    }
}

/// Compute the chronological factor for `line_number` (1-based) out of
/// `total_lines`. Negative or zero `total_lines` clamps to the neutral
/// factor `1.0`.
pub fn score(line_number: usize, total_lines: usize, config: &ChronologicalConfig) -> f64 {
    if total_lines == 0 {
        return 1.0;
    }

    let position = line_number as f64 / total_lines as f64;
    let e = config.early_threshold;
    let m = config.max_early_bonus;
    let t = config.penalty_threshold;

    let factor = if position < e {
        1.5 + (e - position) * (m - 1.5) / e
    } else if position < t {
        1.0 + (t - position) * 0.5 / (t - e)
    } else {
        0.5 + (1.0 - position)
    };

    if factor.is_nan() {
        1.0
    } else {
        factor
    }
}
