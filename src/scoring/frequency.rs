//! Frequency Tracker
//!
//! Process-wide, concurrent-safe sliding-window counter per `pattern_id`.
//! Created lazily on first match, never destroyed; entries older than the
//! window are pruned lazily on read. Backed by `DashMap` so insertion on
//! first-seen is race-free (compute-if-absent) and per-entry mutation
//! (append/prune) is confined to a short critical section per entry.

use std::sync::Arc;
use std::sync::Mutex;

use dashmap::DashMap;

use crate::clock::{Clock, SystemClock};

/// Tunables for frequency penalty scoring.
#[derive(Debug, Clone, Copy)]
pub struct FrequencyConfig {
    pub time_window_hours: f64,
    pub threshold: f64,
    pub max_penalty: f64,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        FrequencyConfig {
            time_window_hours: 1.0,
            threshold: 10.0,
            max_penalty: 0.8,
        }
    }
}

/// The sliding window of match timestamps for a single pattern.
struct PatternFrequency {
    events: Mutex<Vec<i64>>,
}

impl PatternFrequency {
    fn new() -> Self {
        PatternFrequency {
            events: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, now_millis: i64, window_millis: i64) {
        let mut events = self.events.lock().expect("frequency tracker mutex poisoned");
        events.push(now_millis);
        prune(&mut events, now_millis, window_millis);
    }

    fn count_in_window(&self, now_millis: i64, window_millis: i64) -> usize {
        let mut events = self.events.lock().expect("frequency tracker mutex poisoned");
        prune(&mut events, now_millis, window_millis);
        events.len()
    }

    fn reset(&self) {
        self.events.lock().expect("frequency tracker mutex poisoned").clear();
    }
}

fn prune(events: &mut Vec<i64>, now_millis: i64, window_millis: i64) {
    let cutoff = now_millis - window_millis;
    events.retain(|&t| t > cutoff);
}

/// Shared, reentrant sliding-window counter keyed by `pattern_id`.
pub struct FrequencyTracker {
    map: DashMap<String, Arc<PatternFrequency>>,
    clock: Arc<dyn Clock>,
    config: FrequencyConfig,
}

impl FrequencyTracker {
    pub fn new(config: FrequencyConfig) -> Self {
        FrequencyTracker {
            map: DashMap::new(),
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(config: FrequencyConfig, clock: Arc<dyn Clock>) -> Self {
        FrequencyTracker {
            map: DashMap::new(),
            clock,
            config,
        }
    }

    fn window_millis(&self) -> i64 {
        (self.config.time_window_hours * 3_600_000.0) as i64
    }

    /// Record a match for `pattern_id` at the current time. A null/empty
    /// id is a no-op.
    pub fn record(&self, pattern_id: &str) {
        if pattern_id.is_empty() {
            return;
        }

        let entry = self
            .map
            .entry(pattern_id.to_string())
            .or_insert_with(|| Arc::new(PatternFrequency::new()))
            .clone();

        entry.record(self.clock.now_millis(), self.window_millis());
    }

    /// The frequency penalty in `[0, max_penalty]` for `pattern_id`. A
    /// null/empty id returns 0.
    pub fn penalty(&self, pattern_id: &str) -> f64 {
        if pattern_id.is_empty() {
            return 0.0;
        }

        let Some(entry) = self.map.get(pattern_id).map(|e| e.clone()) else {
            return 0.0;
        };

        let count = entry.count_in_window(self.clock.now_millis(), self.window_millis());
        let rate = count as f64 / self.config.time_window_hours;

        if rate <= self.config.threshold {
            return 0.0;
        }

        let penalty = (rate - self.config.threshold) / self.config.threshold;
        penalty.min(self.config.max_penalty).max(0.0)
    }

    pub fn reset(&self, pattern_id: &str) {
        if let Some(entry) = self.map.get(pattern_id) {
            entry.reset();
        }
    }

    pub fn reset_all(&self) {
        self.map.clear();
    }
}

impl Default for FrequencyTracker {
    fn default() -> Self {
        FrequencyTracker::new(FrequencyConfig::default())
    }
}
