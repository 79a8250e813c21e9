//! Engine configuration
//!
//! One field per recognized configuration key (see the spec's external
//! interfaces table), grouped into nested structs per scorer, each with a
//! `#[serde(default)]` matching the documented default. Loadable from YAML
//! or built programmatically, the same way the original pattern engine's
//! `Settings` struct worked.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PatternLoadError;
use crate::scoring::context_scorer::ContextScorerVariant;
use crate::scoring::{ChronologicalConfig, FrequencyConfig, ProximityConfig};

/// Which Context Scorer variant a config file selects. Resolved once at
/// config-load time into a `ContextScorerVariant`; never switched
/// per-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextScorerKind {
    RegexClasses,
    KeywordWeights,
}

impl Default for ContextScorerKind {
    fn default() -> Self {
        ContextScorerKind::RegexClasses
    }
}

/// Context scorer settings as they appear in a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextScorerSettings {
    #[serde(default)]
    pub variant: ContextScorerKind,
    #[serde(default = "default_keywords_directory")]
    pub keywords_directory: PathBuf,
    #[serde(default = "default_max_context_factor")]
    pub max_context_factor: f64,
}

impl Default for ContextScorerSettings {
    fn default() -> Self {
        ContextScorerSettings {
            variant: ContextScorerKind::default(),
            keywords_directory: default_keywords_directory(),
            max_context_factor: default_max_context_factor(),
        }
    }
}

fn default_keywords_directory() -> PathBuf {
    PathBuf::from("keywords")
}

fn default_max_context_factor() -> f64 {
    2.5
}

/// Proximity scorer settings as they appear in a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProximitySettings {
    #[serde(default = "default_decay_constant")]
    pub decay_constant: f64,
    #[serde(default = "default_max_window")]
    pub max_window: usize,
}

impl Default for ProximitySettings {
    fn default() -> Self {
        ProximitySettings {
            decay_constant: default_decay_constant(),
            max_window: default_max_window(),
        }
    }
}

fn default_decay_constant() -> f64 {
    10.0
}

fn default_max_window() -> usize {
    100
}

/// Chronological scorer settings as they appear in a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChronologicalSettings {
    #[serde(default = "default_early_threshold")]
    pub early_bonus_threshold: f64,
    #[serde(default = "default_max_early_bonus")]
    pub max_early_bonus: f64,
    #[serde(default = "default_penalty_threshold")]
    pub penalty_threshold: f64,
}

impl Default for ChronologicalSettings {
    fn default() -> Self {
        ChronologicalSettings {
            early_bonus_threshold: default_early_threshold(),
            max_early_bonus: default_max_early_bonus(),
            penalty_threshold: default_penalty_threshold(),
        }
    }
}

fn default_early_threshold() -> f64 {
    0.2
}

fn default_max_early_bonus() -> f64 {
    2.5
}

fn default_penalty_threshold() -> f64 {
    0.5
}

/// Frequency tracker settings as they appear in a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencySettings {
    #[serde(default = "default_frequency_threshold")]
    pub threshold: f64,
    #[serde(default = "default_max_penalty")]
    pub max_penalty: f64,
    #[serde(default = "default_time_window_hours")]
    pub time_window_hours: f64,
}

impl Default for FrequencySettings {
    fn default() -> Self {
        FrequencySettings {
            threshold: default_frequency_threshold(),
            max_penalty: default_max_penalty(),
            time_window_hours: default_time_window_hours(),
        }
    }
}

fn default_frequency_threshold() -> f64 {
    10.0
}

fn default_max_penalty() -> f64 {
    0.8
}

fn default_time_window_hours() -> f64 {
    1.0
}

/// All scoring settings grouped together, mirroring the `scoring.*` key
/// namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub context: ContextScorerSettings,
    #[serde(default)]
    pub proximity: ProximitySettings,
    #[serde(default)]
    pub chronological: ChronologicalSettings,
    #[serde(default)]
    pub frequency: FrequencySettings,
}

/// Top-level engine configuration: where patterns live, plus every scoring
/// knob.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub pattern_directory: PathBuf,
    #[serde(default)]
    pub scoring: ScoringSettings,
}

impl EngineConfig {
    pub fn proximity_config(&self) -> ProximityConfig {
        ProximityConfig {
            decay_constant: self.scoring.proximity.decay_constant,
            max_window: self.scoring.proximity.max_window,
        }
    }

    pub fn chronological_config(&self) -> ChronologicalConfig {
        ChronologicalConfig {
            early_threshold: self.scoring.chronological.early_bonus_threshold,
            max_early_bonus: self.scoring.chronological.max_early_bonus,
            penalty_threshold: self.scoring.chronological.penalty_threshold,
        }
    }

    pub fn frequency_config(&self) -> FrequencyConfig {
        FrequencyConfig {
            time_window_hours: self.scoring.frequency.time_window_hours,
            threshold: self.scoring.frequency.threshold,
            max_penalty: self.scoring.frequency.max_penalty,
        }
    }

    /// Build the active `ContextScorerVariant`. For `KeywordWeights` this
    /// loads the keywords directory named in config; a missing/unparseable
    /// directory is not fatal (`KeywordLoadError` is logged here and the
    /// variant falls back to an empty weight map, which scores every
    /// context as neutral).
    pub fn context_scorer_variant(&self) -> ContextScorerVariant {
        match self.scoring.context.variant {
            ContextScorerKind::RegexClasses => ContextScorerVariant::RegexClasses {
                max_context_factor: self.scoring.context.max_context_factor,
            },
            ContextScorerKind::KeywordWeights => {
                let weights = crate::keywords::KeywordWeights::load_directory(
                    &self.scoring.context.keywords_directory,
                )
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "keyword load failed, context scorer will be neutral");
                    crate::keywords::KeywordWeights::empty()
                });
                ContextScorerVariant::KeywordWeights { weights }
            }
        }
    }
}

/// Parse an `EngineConfig` from a YAML string.
pub fn parse_config(yaml: &str) -> Result<EngineConfig, PatternLoadError> {
    serde_yaml::from_str(yaml).map_err(|source| PatternLoadError::Parse {
        path: "<config>".to_string(),
        source,
    })
}

/// Load an `EngineConfig` from a YAML file.
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> Result<EngineConfig, PatternLoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| PatternLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&content)
}
