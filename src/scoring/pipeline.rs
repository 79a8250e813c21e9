//! Scoring Pipeline
//!
//! Composes the independent factors into the final score for a single
//! `MatchedEvent`. Each factor is computable independently of the others
//! (a factor can be neutralized in config without touching the rest of the
//! pipeline) and the composed score is never capped.

use std::sync::Arc;

use crate::context::EventContext;
use crate::registry::CompiledPattern;
use crate::scoring::chronological::{self, ChronologicalConfig};
use crate::scoring::context_scorer::{self, ContextScorerVariant};
use crate::scoring::frequency::FrequencyTracker;
use crate::scoring::proximity::{self, ProximityConfig};
use crate::scoring::sequence;

/// Every independently-configurable knob the pipeline composes factors
/// from.
#[derive(Clone)]
pub struct ScoringConfig {
    pub chronological: ChronologicalConfig,
    pub proximity: ProximityConfig,
    pub context_scorer: ContextScorerVariant,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            chronological: ChronologicalConfig::default(),
            proximity: ProximityConfig::default(),
            context_scorer: ContextScorerVariant::default(),
        }
    }
}

/// Ties the configured factor computations to a shared Frequency Tracker.
pub struct ScoringPipeline {
    config: ScoringConfig,
    frequency: Arc<FrequencyTracker>,
}

/// Replace a NaN factor with its neutral value so the pipeline can never
/// produce NaN overall.
fn neutral_if_nan(value: f64, neutral: f64) -> f64 {
    if value.is_nan() {
        neutral
    } else {
        value
    }
}

impl ScoringPipeline {
    pub fn new(config: ScoringConfig, frequency: Arc<FrequencyTracker>) -> Self {
        ScoringPipeline { config, frequency }
    }

    /// Compute the score for one match of `pattern` at zero-based line
    /// index `p` (one-based `line_number = p + 1`) within `lines`, with its
    /// already-extracted `context`.
    ///
    /// `record_frequency` should be called by the orchestrator *after* this
    /// call returns, so the current match never penalizes itself.
    pub fn score(
        &self,
        pattern: &CompiledPattern,
        lines: &[String],
        p: usize,
        total_lines: usize,
        context: &EventContext,
    ) -> f64 {
        let base_confidence = neutral_if_nan(pattern.primary_pattern.confidence, 1.0);
        let severity_multiplier = neutral_if_nan(pattern.severity.multiplier(), 1.0);

        let chronological_factor = neutral_if_nan(
            chronological::score(p + 1, total_lines, &self.config.chronological),
            1.0,
        );

        let proximity_factor = neutral_if_nan(
            proximity::score(&pattern.secondary_patterns, lines, p, &self.config.proximity),
            1.0,
        );

        let temporal_factor =
            neutral_if_nan(sequence::score(&pattern.sequence_patterns, lines, p), 1.0);

        let context_factor =
            neutral_if_nan(context_scorer::score(context, &self.config.context_scorer), 1.0);

        let frequency_penalty = neutral_if_nan(self.frequency.penalty(&pattern.id), 0.0);

        base_confidence
            * severity_multiplier
            * chronological_factor
            * proximity_factor
            * temporal_factor
            * context_factor
            * (1.0 - frequency_penalty)
    }

    pub fn frequency_tracker(&self) -> &Arc<FrequencyTracker> {
        &self.frequency
    }
}
