//! Context Scorer
//!
//! Two interchangeable variants, selected at config-load time (never
//! per-request): Variant A counts regex classes (error/warning/stack-trace/
//! exception) with a density penalty and a cap; Variant B sums
//! keyword-weight occurrences with no cap. A null/empty context scores 1.0
//! under either variant.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::EventContext;
use crate::keywords::KeywordWeights;

/// Which Context Scorer variant is active. Resolved once at config-load
/// time; the scorer trio the pipeline is built with never switches variant
/// mid-run.
#[derive(Debug, Clone)]
pub enum ContextScorerVariant {
    RegexClasses { max_context_factor: f64 },
    KeywordWeights { weights: KeywordWeights },
}

impl Default for ContextScorerVariant {
    fn default() -> Self {
        ContextScorerVariant::RegexClasses {
            max_context_factor: 2.5,
        }
    }
}

static ERROR_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(ERROR|FATAL|CRITICAL|SEVERE)\b").unwrap());
static WARN_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(WARN|WARNING)\b").unwrap());
static STACK_FRAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*at\s+[\w.$]+\(.*\)\s*$").unwrap());
static EXCEPTION_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w*Exception\b|\b\w*Error\b").unwrap());

fn score_regex_classes(context: &EventContext, max_context_factor: f64) -> f64 {
    let mut score = 0.0;
    let mut error_lines = 0usize;
    let mut stack_trace_lines = 0usize;
    let mut total_lines = 0usize;

    for line in context.all_lines() {
        total_lines += 1;

        if ERROR_CLASS.is_match(line) {
            score += 0.4;
            error_lines += 1;
        } else if WARN_CLASS.is_match(line) {
            score += 0.2;
        }

        if STACK_FRAME.is_match(line) {
            score += 0.1;
            stack_trace_lines += 1;
        }

        if EXCEPTION_CLASS.is_match(line) {
            score += 0.3;
        }
    }

    let stack_bonus = (stack_trace_lines as f64 * 0.1).min(0.5);
    score += stack_bonus;

    if total_lines > 10 && (error_lines + stack_trace_lines) as f64 > 0.7 * total_lines as f64 {
        score *= 0.8;
    }

    (1.0 + score).min(max_context_factor)
}

fn score_keyword_weights(context: &EventContext, weights: &KeywordWeights) -> f64 {
    if weights.is_empty() {
        return 1.0;
    }

    let mut total = 0.0;
    for line in context.all_lines() {
        for (keyword, weight) in weights.iter() {
            let occurrences = line.matches(keyword).count();
            if occurrences > 0 {
                total += weight * occurrences as f64;
            }
        }
    }

    1.0 + total
}

/// Score a single event's context under the active variant.
pub fn score(context: &EventContext, variant: &ContextScorerVariant) -> f64 {
    if context.total_lines() == 0 {
        return 1.0;
    }

    let factor = match variant {
        ContextScorerVariant::RegexClasses { max_context_factor } => {
            score_regex_classes(context, *max_context_factor)
        }
        ContextScorerVariant::KeywordWeights { weights } => score_keyword_weights(context, weights),
    };

    if factor.is_nan() {
        1.0
    } else {
        factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ctx(lines_before: &[&str], matched: &str, lines_after: &[&str]) -> EventContext {
        EventContext {
            lines_before: lines_before.iter().map(|s| s.to_string()).collect(),
            matched_line: matched.to_string(),
            lines_after: lines_after.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn regex_variant_scores_plain_lines_as_neutral() {
        let context = ctx(&["hello", "world"], "ok", &["done"]);
        let variant = ContextScorerVariant::RegexClasses {
            max_context_factor: 2.5,
        };
        assert_eq!(score(&context, &variant), 1.0);
    }

    #[test]
    fn regex_variant_respects_cap() {
        let many_errors: Vec<String> = (0..20).map(|_| "ERROR something bad Exception".to_string()).collect();
        let context = EventContext {
            lines_before: many_errors.clone(),
            matched_line: "ERROR final".to_string(),
            lines_after: vec![],
        };
        let variant = ContextScorerVariant::RegexClasses {
            max_context_factor: 2.5,
        };
        let factor = score(&context, &variant);
        assert!(factor <= 2.5);
    }

    #[test]
    fn matches_spec_scenario_s3_density_penalty_engages() {
        // 12 lines total, 10 ERROR lines (5 before + matched + 4 after), 2
        // plain => density 10/12 > 0.7 => *0.8 applied.
        let mut before: Vec<&str> = vec!["ERROR a"; 5];
        before.extend(vec!["plain", "plain"]);
        let after: Vec<&str> = vec!["ERROR b"; 4];
        let context = ctx(&before, "ERROR matched", &after);
        assert_eq!(context.total_lines(), 12);

        // uncapped so the density multiplier's numeric effect is visible
        // rather than hidden behind the cap
        let variant = ContextScorerVariant::RegexClasses {
            max_context_factor: 100.0,
        };
        let penalized = score(&context, &variant);

        // 10 ERROR-class lines at +0.4 each, no stack frames, no exceptions:
        // raw score 4.0, density penalty 0.7 < 10/12 multiplies it by 0.8.
        let expected = 1.0 + (10.0 * 0.4) * 0.8;
        assert!((penalized - expected).abs() < 1e-9);

        // Same per-line composition but with total_lines <= 10, so the
        // density penalty's threshold never engages: no *0.8.
        let small_context = ctx(&["ERROR a"; 4], "ERROR matched", &["plain"]);
        let unpenalized = score(&small_context, &variant);
        let expected_unpenalized = 1.0 + 5.0 * 0.4;
        assert!((unpenalized - expected_unpenalized).abs() < 1e-9);
    }

    #[test]
    fn keyword_variant_sums_weighted_occurrences() {
        let mut map = HashMap::new();
        map.insert("timeout".to_string(), 0.5);
        map.insert("refused".to_string(), 0.3);
        let weights = KeywordWeights::from_map(map);

        let context = ctx(&["connection timeout"], "connection refused", &["timeout timeout"]);
        let variant = ContextScorerVariant::KeywordWeights { weights };
        let factor = score(&context, &variant);

        // timeout: 1 (before) + 2 (after) = 3 occurrences * 0.5 = 1.5
        // refused: 1 (matched) * 0.3 = 0.3
        let expected = 1.0 + 1.5 + 0.3;
        assert!((factor - expected).abs() < 1e-9);
    }

    #[test]
    fn keyword_variant_with_no_weights_is_neutral() {
        let context = ctx(&["anything"], "matched", &[]);
        let variant = ContextScorerVariant::KeywordWeights {
            weights: KeywordWeights::empty(),
        };
        assert_eq!(score(&context, &variant), 1.0);
    }
}
