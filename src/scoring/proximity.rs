//! Proximity Scorer
//!
//! Exponential-decay bonus from secondary patterns found near a primary
//! match.

use crate::registry::CompiledSecondaryPattern;

/// Tunables for proximity scoring.
#[derive(Debug, Clone, Copy)]
pub struct ProximityConfig {
    pub decay_constant: f64,
    pub max_window: usize,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        ProximityConfig {
            decay_constant: 10.0,
            max_window: 100,
        }
    }
}

/// Compute the proximity factor for a primary match at zero-based index `p`
/// against `lines`, given this pattern's secondary patterns.
///
/// For each secondary, search `[p - window, p + window]` (clamped, skipping
/// `p` itself) for the nearest match at distance `d`, then contribute
/// `weight * exp(-d / decay_constant)`. No match contributes 0. The factor
/// is `1.0 + sum(contributions)`; with no secondaries it is exactly `1.0`.
pub fn score(
    secondaries: &[CompiledSecondaryPattern],
    lines: &[String],
    p: usize,
    config: &ProximityConfig,
) -> f64 {
    if secondaries.is_empty() {
        return 1.0;
    }

    let mut total = 0.0;
    for secondary in secondaries {
        let window = secondary.proximity_window.min(config.max_window);
        let start = p.saturating_sub(window);
        let end = (p + window + 1).min(lines.len());

        let mut best_distance: Option<usize> = None;
        for i in start..end {
            if i == p {
                continue;
            }
            if secondary.regex.is_match(&lines[i]) {
                let d = i.abs_diff(p);
                best_distance = Some(match best_distance {
                    Some(current) if current <= d => current,
                    _ => d,
                });
            }
        }

        if let Some(d) = best_distance {
            total += secondary.weight * (-(d as f64) / config.decay_constant).exp();
        }
    }

    let factor = 1.0 + total;
    if factor.is_nan() {
        1.0
    } else {
        factor
    }
}
