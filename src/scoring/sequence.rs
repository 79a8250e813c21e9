//! Sequence Scorer (temporal factor)
//!
//! Detects ordered sequence-event chains culminating at or near the primary
//! match. Preserves a quirk of the reference implementation: the anchor for
//! walking backward through the chain is always the primary index `p`, not
//! wherever the last event actually matched (see design notes on the
//! sequence-matching open question — flagged, not "fixed").

use crate::registry::CompiledSequencePattern;

/// How far from the primary match the last sequence event is allowed to be.
const LAST_EVENT_WINDOW: usize = 5;

/// Does a single sequence pattern match, ending at or near `p`?
fn sequence_matches(sequence: &CompiledSequencePattern, lines: &[String], p: usize) -> bool {
    let events = &sequence.events;
    debug_assert!(!events.is_empty());

    let window_start = p.saturating_sub(LAST_EVENT_WINDOW);
    let window_end = (p + LAST_EVENT_WINDOW + 1).min(lines.len());

    let last = events.last().expect("sequence events are non-empty");
    let last_matches_in_window = (window_start..window_end).any(|i| last.regex.is_match(&lines[i]));
    if !last_matches_in_window {
        return false;
    }

    // Reference behavior: cursor anchors at the primary index regardless of
    // where the last event's match actually landed.
    let mut cursor = p;

    for event in events[..events.len() - 1].iter().rev() {
        match (0..cursor).rev().find(|&i| event.regex.is_match(&lines[i])) {
            Some(found_at) => cursor = found_at,
            None => return false,
        }
    }

    true
}

/// Compute the temporal factor: `1.0 + sum(bonus_multiplier)` over every
/// sequence pattern that matches. Zero sequences (or zero matching
/// sequences) yields exactly `1.0`.
pub fn score(sequences: &[CompiledSequencePattern], lines: &[String], p: usize) -> f64 {
    if sequences.is_empty() {
        return 1.0;
    }

    let total: f64 = sequences
        .iter()
        .filter(|s| sequence_matches(s, lines, p))
        .map(|s| s.bonus_multiplier)
        .sum();

    let factor = 1.0 + total;
    if factor.is_nan() {
        1.0
    } else {
        factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CompiledSequenceEvent;
    use regex::Regex;

    fn seq(events: &[&str], bonus: f64) -> CompiledSequencePattern {
        CompiledSequencePattern {
            description: "test sequence".to_string(),
            bonus_multiplier: bonus,
            events: events
                .iter()
                .map(|r| CompiledSequenceEvent {
                    regex: Regex::new(r).unwrap(),
                })
                .collect(),
        }
    }

    fn lines(rows: &[&str]) -> Vec<String> {
        rows.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_sequences_is_neutral() {
        let lines = lines(&["a", "b"]);
        assert_eq!(score(&[], &lines, 1), 1.0);
    }

    #[test]
    fn full_chain_in_order_matches() {
        let lines = lines(&["connecting", "retrying", "timeout"]);
        let sequences = vec![seq(&["connecting", "retrying", "timeout"], 0.5)];
        assert_eq!(score(&sequences, &lines, 2), 1.5);
    }

    #[test]
    fn missing_earlier_event_fails_the_sequence() {
        let lines = lines(&["retrying", "timeout"]);
        let sequences = vec![seq(&["connecting", "retrying", "timeout"], 0.5)];
        assert_eq!(score(&sequences, &lines, 1), 1.0);
    }

    #[test]
    fn last_event_outside_window_fails() {
        let lines: Vec<String> = (0..20)
            .map(|i| if i == 0 { "timeout".to_string() } else { "noise".to_string() })
            .collect();
        let sequences = vec![seq(&["timeout"], 1.0)];
        assert_eq!(score(&sequences, &lines, 15), 1.0);
    }

    #[test]
    fn multiple_matching_sequences_sum_bonuses() {
        let lines = lines(&["connecting", "timeout"]);
        let sequences = vec![
            seq(&["connecting", "timeout"], 0.3),
            seq(&["timeout"], 0.2),
        ];
        let factor = score(&sequences, &lines, 1);
        assert!((factor - 1.5).abs() < 1e-9);
    }
}
