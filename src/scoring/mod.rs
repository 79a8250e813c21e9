//! Scoring components: the five independently-configurable factors plus
//! the pipeline that multiplies them together.

pub mod chronological;
pub mod context_scorer;
pub mod frequency;
pub mod pipeline;
pub mod proximity;
pub mod sequence;

pub use chronological::ChronologicalConfig;
pub use context_scorer::ContextScorerVariant;
pub use frequency::{FrequencyConfig, FrequencyTracker};
pub use pipeline::{ScoringConfig, ScoringPipeline};
pub use proximity::ProximityConfig;
