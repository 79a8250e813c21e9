//! Analysis Orchestrator
//!
//! Iterates log lines × patterns, constructs `MatchedEvent`s, scores them,
//! and assembles the final `AnalysisResult`. This is the component every
//! other module in this crate exists to serve.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{self, EventContext};
use crate::error::{EngineError, InvalidInputError};
use crate::pattern::Severity;
use crate::registry::PatternRegistry;
use crate::scoring::ScoringPipeline;

/// Minimal pod identity the engine consumes. Everything else about the pod
/// (namespace, labels, owner references, ...) is Kubernetes plumbing the
/// supervisor owns and this engine never looks at.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodInfo {
    pub name: Option<String>,
}

/// The engine's entire input contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodFailureData {
    pub logs: Option<String>,
    pub pod: Option<PodInfo>,
}

impl PodFailureData {
    pub fn new(logs: impl Into<String>, pod_name: impl Into<String>) -> Self {
        PodFailureData {
            logs: Some(logs.into()),
            pod: Some(PodInfo {
                name: Some(pod_name.into()),
            }),
        }
    }

    fn validate(&self) -> Result<&str, EngineError> {
        let logs = self
            .logs
            .as_deref()
            .ok_or(InvalidInputError::MissingLogs)?;
        if self.pod.is_none() {
            return Err(InvalidInputError::MissingPod.into());
        }
        Ok(logs)
    }
}

/// A pattern reference carried on a `MatchedEvent`, identifying the pattern
/// without re-serializing its compiled regexes.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedPatternRef {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub library_id: String,
}

/// A single pattern match, scored.
#[derive(Debug, Clone, Serialize)]
pub struct MatchedEvent {
    pub line_number: usize,
    pub matched_pattern: MatchedPatternRef,
    pub context: EventContext,
    pub score: f64,
}

/// Run metadata independent of the matches themselves.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMetadata {
    pub processing_time_ms: u128,
    pub total_lines: usize,
    pub analyzed_at: DateTime<Utc>,
    pub patterns_used: Vec<String>,
}

/// A rollup of the matches found.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub significant_events: usize,
    pub highest_severity: String,
    pub severity_distribution: HashMap<String, usize>,
}

/// The full result of one analysis invocation.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub analysis_id: Uuid,
    pub events: Vec<MatchedEvent>,
    pub metadata: AnalysisMetadata,
    pub summary: AnalysisSummary,
}

static LINE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").unwrap());

/// Split `logs` the way `§4.2` specifies: on `\r?\n`, with the documented
/// empty-input special case (`""` yields exactly one empty line rather than
/// zero) and the reference `split` behavior of dropping *trailing* empty
/// elements only — a single trailing newline does not count as an extra
/// line, but interior blank lines still do, and an all-newline body can
/// legitimately collapse to zero lines (the `NumericEdge` case).
fn split_lines(logs: &str) -> Vec<String> {
    if logs.is_empty() {
        return vec![String::new()];
    }

    let mut lines: Vec<String> = LINE_SPLIT.split(logs).map(|s| s.to_string()).collect();
    while lines.last().is_some_and(|s| s.is_empty()) {
        lines.pop();
    }
    lines
}

/// Ties a `PatternRegistry` and `ScoringPipeline` together to run complete
/// analyses. Stateless itself beyond what the pipeline's Frequency Tracker
/// owns; safe to share across concurrent invocations.
pub struct AnalysisOrchestrator {
    registry: Arc<PatternRegistry>,
    pipeline: ScoringPipeline,
}

impl AnalysisOrchestrator {
    pub fn new(registry: Arc<PatternRegistry>, pipeline: ScoringPipeline) -> Self {
        AnalysisOrchestrator { registry, pipeline }
    }

    /// Run one analysis. Single-threaded per call; reentrant across calls
    /// from different threads.
    pub fn analyze(&self, input: &PodFailureData) -> Result<AnalysisResult, EngineError> {
        let started = Instant::now();
        let logs = input.validate()?;

        let lines = split_lines(logs);
        let total_lines = lines.len();

        let mut events = Vec::new();
        let mut patterns_used = Vec::new();
        let mut seen_library_ids = std::collections::HashSet::new();

        for (index, line) in lines.iter().enumerate() {
            for pattern in self.registry.patterns() {
                let matched = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    pattern.primary_pattern.regex.is_match(line)
                }));

                let matched = match matched {
                    Ok(m) => m,
                    Err(_) => {
                        tracing::warn!(
                            pattern_id = %pattern.id,
                            line_number = index + 1,
                            "pattern scan panicked; isolating this pattern for this invocation"
                        );
                        continue;
                    }
                };

                if !matched {
                    continue;
                }

                if seen_library_ids.insert(pattern.library_id.clone()) {
                    patterns_used.push(pattern.library_id.clone());
                }

                let ctx = context::extract(&lines, index, pattern.context_extraction.as_ref());

                let score_result = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    self.pipeline.score(pattern, &lines, index, total_lines, &ctx)
                }));

                let score = match score_result {
                    Ok(s) => s,
                    Err(_) => {
                        tracing::warn!(
                            pattern_id = %pattern.id,
                            line_number = index + 1,
                            "scoring panicked; isolating this pattern for this invocation"
                        );
                        continue;
                    }
                };

                self.pipeline.frequency_tracker().record(&pattern.id);

                events.push(MatchedEvent {
                    line_number: index + 1,
                    matched_pattern: MatchedPatternRef {
                        id: pattern.id.clone(),
                        name: pattern.name.clone(),
                        severity: pattern.severity,
                        library_id: pattern.library_id.clone(),
                    },
                    context: ctx,
                    score,
                });
            }
        }

        let summary = summarize(&events);

        Ok(AnalysisResult {
            analysis_id: Uuid::new_v4(),
            events,
            metadata: AnalysisMetadata {
                processing_time_ms: started.elapsed().as_millis(),
                total_lines,
                analyzed_at: Utc::now(),
                patterns_used,
            },
            summary,
        })
    }
}

fn severity_rank(severity: &str) -> u8 {
    match severity {
        "CRITICAL" => 5,
        "HIGH" => 4,
        "MEDIUM" => 3,
        "LOW" => 2,
        "INFO" => 1,
        _ => 0,
    }
}

fn summarize(events: &[MatchedEvent]) -> AnalysisSummary {
    let mut severity_distribution: HashMap<String, usize> = HashMap::new();
    let mut highest_severity = "NONE".to_string();

    for event in events {
        let key = event.matched_pattern.severity.as_str().to_string();
        *severity_distribution.entry(key.clone()).or_insert(0) += 1;
        if severity_rank(&key) > severity_rank(&highest_severity) {
            highest_severity = key;
        }
    }

    AnalysisSummary {
        significant_events: events.len(),
        highest_severity,
        severity_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Pattern, PatternSet, PatternSetMetadata, PrimaryPattern};
    use crate::scoring::ScoringConfig;

    fn registry_with(patterns: Vec<Pattern>) -> Arc<PatternRegistry> {
        Arc::new(
            PatternRegistry::from_pattern_sets(vec![PatternSet {
                metadata: PatternSetMetadata {
                    library_id: "lib-a".to_string(),
                    description: None,
                },
                patterns,
            }])
            .unwrap(),
        )
    }

    fn orchestrator(registry: Arc<PatternRegistry>) -> AnalysisOrchestrator {
        let pipeline = ScoringPipeline::new(
            ScoringConfig::default(),
            Arc::new(crate::scoring::FrequencyTracker::default()),
        );
        AnalysisOrchestrator::new(registry, pipeline)
    }

    fn oom_pattern() -> Pattern {
        Pattern {
            id: "oom".to_string(),
            name: "Out of memory".to_string(),
            severity: Severity::High,
            primary_pattern: PrimaryPattern {
                regex: "OutOfMemoryError".to_string(),
                confidence: 0.9,
            },
            secondary_patterns: vec![],
            sequence_patterns: vec![],
            context_extraction: None,
        }
    }

    #[test]
    fn rejects_missing_logs() {
        let orch = orchestrator(registry_with(vec![oom_pattern()]));
        let input = PodFailureData {
            logs: None,
            pod: Some(PodInfo { name: Some("p".into()) }),
        };
        assert!(orch.analyze(&input).is_err());
    }

    #[test]
    fn rejects_missing_pod() {
        let orch = orchestrator(registry_with(vec![oom_pattern()]));
        let input = PodFailureData {
            logs: Some("ERROR OutOfMemoryError".to_string()),
            pod: None,
        };
        assert!(orch.analyze(&input).is_err());
    }

    #[test]
    fn matches_spec_scenario_s1_end_to_end() {
        let orch = orchestrator(registry_with(vec![oom_pattern()]));
        let input = PodFailureData::new("INFO ok\nERROR OutOfMemoryError\n", "pod-1");
        let result = orch.analyze(&input).unwrap();

        assert_eq!(result.events.len(), 1);
        let event = &result.events[0];
        assert_eq!(event.line_number, 2);
        assert!((event.score - 1.35).abs() < 1e-9);
        assert_eq!(result.summary.significant_events, 1);
        assert_eq!(result.summary.highest_severity, "HIGH");
    }

    #[test]
    fn matches_spec_scenario_s6_empty_logs() {
        let orch = orchestrator(registry_with(vec![oom_pattern()]));
        let input = PodFailureData::new("", "pod-1");
        let result = orch.analyze(&input).unwrap();

        assert!(result.events.is_empty());
        assert_eq!(result.summary.highest_severity, "NONE");
        assert!(result.summary.severity_distribution.is_empty());
        assert_eq!(result.metadata.total_lines, 1);
    }

    #[test]
    fn invariant_events_length_equals_significant_events() {
        let orch = orchestrator(registry_with(vec![oom_pattern()]));
        let input = PodFailureData::new(
            "ERROR OutOfMemoryError\nplain\nERROR OutOfMemoryError\n",
            "pod-1",
        );
        let result = orch.analyze(&input).unwrap();
        assert_eq!(result.events.len(), result.summary.significant_events);
        let total: usize = result.summary.severity_distribution.values().sum();
        assert_eq!(total, result.summary.significant_events);
    }

    #[test]
    fn invariant_line_numbers_are_one_based_and_in_range() {
        let orch = orchestrator(registry_with(vec![oom_pattern()]));
        let input = PodFailureData::new(
            "plain\nERROR OutOfMemoryError\nplain\nERROR OutOfMemoryError\n",
            "pod-1",
        );
        let result = orch.analyze(&input).unwrap();
        for event in &result.events {
            assert!(event.line_number >= 1 && event.line_number <= result.metadata.total_lines);
        }
    }

    #[test]
    fn reordering_pattern_sets_changes_order_not_scores() {
        let mut other = oom_pattern();
        other.id = "oom2".to_string();
        other.primary_pattern.regex = "OutOfMemoryError".to_string();

        let registry_a = registry_with(vec![oom_pattern(), other.clone()]);
        let registry_b = registry_with(vec![other, oom_pattern()]);

        let orch_a = orchestrator(registry_a);
        let orch_b = orchestrator(registry_b);

        let input = PodFailureData::new("ERROR OutOfMemoryError\n", "pod-1");
        let result_a = orch_a.analyze(&input).unwrap();
        let result_b = orch_b.analyze(&input).unwrap();

        let mut scores_a: Vec<f64> = result_a.events.iter().map(|e| e.score).collect();
        let mut scores_b: Vec<f64> = result_b.events.iter().map(|e| e.score).collect();
        scores_a.sort_by(|a, b| a.partial_cmp(b).unwrap());
        scores_b.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(scores_a, scores_b);

        let ids_a: Vec<&str> = result_a
            .events
            .iter()
            .map(|e| e.matched_pattern.id.as_str())
            .collect();
        let ids_b: Vec<&str> = result_b
            .events
            .iter()
            .map(|e| e.matched_pattern.id.as_str())
            .collect();
        assert_ne!(ids_a, ids_b);
    }

    #[test]
    fn rerunning_with_fresh_tracker_is_deterministic() {
        let input = PodFailureData::new(
            "INFO ok\nERROR OutOfMemoryError\nplain\n",
            "pod-1",
        );

        let orch_1 = orchestrator(registry_with(vec![oom_pattern()]));
        let orch_2 = orchestrator(registry_with(vec![oom_pattern()]));

        let result_1 = orch_1.analyze(&input).unwrap();
        let result_2 = orch_2.analyze(&input).unwrap();

        assert_eq!(result_1.events.len(), result_2.events.len());
        for (a, b) in result_1.events.iter().zip(result_2.events.iter()) {
            assert_eq!(a.line_number, b.line_number);
            assert!((a.score - b.score).abs() < 1e-9);
        }
    }
}
