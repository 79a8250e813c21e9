//! On-disk pattern data model
//!
//! These are the shapes a pattern file deserializes into. They carry raw
//! regex strings; [`crate::registry`] is responsible for compiling them
//! exactly once and never re-exposing the raw strings on the hot path.

use serde::{Deserialize, Serialize};

/// Severity level a pattern is authored with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Fixed severity multiplier table used by the scoring pipeline.
    /// Case-insensitive by construction: `Severity` itself is the parsed,
    /// case-normalized form, so lookup here never needs to guess casing.
    pub fn multiplier(&self) -> f64 {
        match self {
            Severity::Critical => 5.0,
            Severity::High => 3.0,
            Severity::Medium => 2.0,
            Severity::Low => 1.5,
            Severity::Info => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }
}

/// The regex that declares an event at a log line, with an author-supplied
/// prior confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryPattern {
    pub regex: String,
    pub confidence: f64,
}

/// A supporting regex whose nearby presence raises an event's score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryPattern {
    pub regex: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub proximity_window: usize,
}

fn default_weight() -> f64 {
    1.0
}

/// A single step of an ordered sequence pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceEvent {
    pub regex: String,
}

/// An ordered chain of events that, appearing in order and culminating at or
/// near the primary match, contributes a flat bonus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencePattern {
    pub description: String,
    pub events: Vec<SequenceEvent>,
    #[serde(default = "default_bonus_multiplier")]
    pub bonus_multiplier: f64,
}

fn default_bonus_multiplier() -> f64 {
    1.0
}

/// Context-window extraction rules for a pattern.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContextExtraction {
    #[serde(default)]
    pub lines_before: usize,
    #[serde(default)]
    pub lines_after: usize,
    /// Accepted but unused: no consumer reads this yet. See design notes.
    #[serde(default)]
    pub include_stack_trace: bool,
}

/// A single named failure pattern as authored in a pattern file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub primary_pattern: PrimaryPattern,
    #[serde(default)]
    pub secondary_patterns: Vec<SecondaryPattern>,
    #[serde(default)]
    pub sequence_patterns: Vec<SequencePattern>,
    #[serde(default)]
    pub context_extraction: Option<ContextExtraction>,
}

/// Metadata describing the library a pattern set belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSetMetadata {
    pub library_id: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A file-level grouping of patterns, corresponding to one pattern file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSet {
    pub metadata: PatternSetMetadata,
    pub patterns: Vec<Pattern>,
}
