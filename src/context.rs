//! Context Extractor
//!
//! Produces the `EventContext` (lines before/at/after) for a single match,
//! per that pattern's `ContextExtraction` rules.

use serde::{Deserialize, Serialize};

use crate::pattern::ContextExtraction;

/// The window of log lines around a primary match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventContext {
    pub lines_before: Vec<String>,
    pub matched_line: String,
    pub lines_after: Vec<String>,
}

impl EventContext {
    /// All lines in order: before, matched, after. This is the slice every
    /// Context Scorer variant operates on.
    pub fn all_lines(&self) -> impl Iterator<Item = &str> {
        self.lines_before
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.matched_line.as_str()))
            .chain(self.lines_after.iter().map(String::as_str))
    }

    pub fn total_lines(&self) -> usize {
        self.lines_before.len() + 1 + self.lines_after.len()
    }
}

/// Extract the context window around `match_index` in `lines`, per `rules`.
/// A `None` rule set yields an empty before/after window with only the
/// matched line.
pub fn extract(lines: &[String], match_index: usize, rules: Option<&ContextExtraction>) -> EventContext {
    let matched_line = lines[match_index].clone();

    let (lines_before, lines_after) = match rules {
        None => (Vec::new(), Vec::new()),
        Some(rules) => {
            let before_start = match_index.saturating_sub(rules.lines_before);
            let lines_before = lines[before_start..match_index].to_vec();

            let after_end = (match_index + 1 + rules.lines_after).min(lines.len());
            let lines_after = lines[(match_index + 1)..after_end].to_vec();

            (lines_before, lines_after)
        }
    };

    EventContext {
        lines_before,
        matched_line,
        lines_after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line-{i}")).collect()
    }

    #[test]
    fn no_rules_yields_matched_line_only() {
        let lines = lines(5);
        let ctx = extract(&lines, 2, None);
        assert!(ctx.lines_before.is_empty());
        assert!(ctx.lines_after.is_empty());
        assert_eq!(ctx.matched_line, "line-2");
    }

    #[test]
    fn windows_clamp_at_log_boundaries() {
        let lines = lines(5);
        let rules = ContextExtraction {
            lines_before: 10,
            lines_after: 10,
            include_stack_trace: false,
        };
        let ctx = extract(&lines, 0, Some(&rules));
        assert!(ctx.lines_before.is_empty());
        assert_eq!(ctx.lines_after.len(), 4);

        let ctx = extract(&lines, 4, Some(&rules));
        assert_eq!(ctx.lines_before.len(), 4);
        assert!(ctx.lines_after.is_empty());
    }

    #[test]
    fn interior_window_is_exact() {
        let lines = lines(10);
        let rules = ContextExtraction {
            lines_before: 2,
            lines_after: 1,
            include_stack_trace: false,
        };
        let ctx = extract(&lines, 5, Some(&rules));
        assert_eq!(ctx.lines_before, vec!["line-3", "line-4"]);
        assert_eq!(ctx.matched_line, "line-5");
        assert_eq!(ctx.lines_after, vec!["line-6"]);
    }
}
