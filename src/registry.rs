//! Pattern Registry
//!
//! Loads a directory of pattern files, validates every regex, and exposes an
//! immutable, precompiled snapshot to the rest of the engine. A `Pattern` is
//! the on-disk shape (raw regex strings); a `CompiledPattern` is the loaded
//! shape the scorers actually touch. The translation happens once, here,
//! and the raw strings never reappear on the hot path.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::PatternLoadError;
use crate::pattern::{ContextExtraction, Pattern, PatternSet, Severity};

/// A primary regex, precompiled.
pub struct CompiledPrimaryPattern {
    pub confidence: f64,
    pub regex: Regex,
}

/// A secondary regex, precompiled.
pub struct CompiledSecondaryPattern {
    pub weight: f64,
    pub proximity_window: usize,
    pub regex: Regex,
}

/// A sequence step, precompiled.
pub struct CompiledSequenceEvent {
    pub regex: Regex,
}

/// An ordered sequence pattern, precompiled.
pub struct CompiledSequencePattern {
    pub description: String,
    pub bonus_multiplier: f64,
    pub events: Vec<CompiledSequenceEvent>,
}

/// A fully precompiled pattern ready for matching and scoring.
pub struct CompiledPattern {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub library_id: String,
    pub primary_pattern: CompiledPrimaryPattern,
    pub secondary_patterns: Vec<CompiledSecondaryPattern>,
    pub sequence_patterns: Vec<CompiledSequencePattern>,
    pub context_extraction: Option<ContextExtraction>,
}

impl CompiledPattern {
    fn compile(pattern: Pattern, library_id: &str) -> Result<Self, PatternLoadError> {
        let primary_regex = Regex::new(&pattern.primary_pattern.regex).map_err(|source| {
            PatternLoadError::InvalidRegex {
                path: library_id.to_string(),
                pattern_id: pattern.id.clone(),
                source,
            }
        })?;

        let mut secondary_patterns = Vec::with_capacity(pattern.secondary_patterns.len());
        for secondary in pattern.secondary_patterns {
            match Regex::new(&secondary.regex) {
                Ok(regex) => secondary_patterns.push(CompiledSecondaryPattern {
                    weight: secondary.weight,
                    proximity_window: secondary.proximity_window,
                    regex,
                }),
                Err(e) => {
                    tracing::warn!(
                        pattern_id = %pattern.id,
                        regex = %secondary.regex,
                        error = %e,
                        "skipping secondary pattern with invalid regex"
                    );
                }
            }
        }

        let mut sequence_patterns = Vec::with_capacity(pattern.sequence_patterns.len());
        for sequence in pattern.sequence_patterns {
            let mut events = Vec::with_capacity(sequence.events.len());
            let mut ok = true;
            for event in &sequence.events {
                match Regex::new(&event.regex) {
                    Ok(regex) => events.push(CompiledSequenceEvent { regex }),
                    Err(e) => {
                        tracing::warn!(
                            pattern_id = %pattern.id,
                            regex = %event.regex,
                            error = %e,
                            "skipping sequence pattern with invalid event regex"
                        );
                        ok = false;
                        break;
                    }
                }
            }
            if ok && !events.is_empty() {
                sequence_patterns.push(CompiledSequencePattern {
                    description: sequence.description,
                    bonus_multiplier: sequence.bonus_multiplier,
                    events,
                });
            }
        }

        Ok(CompiledPattern {
            id: pattern.id,
            name: pattern.name,
            severity: pattern.severity,
            library_id: library_id.to_string(),
            primary_pattern: CompiledPrimaryPattern {
                confidence: pattern.primary_pattern.confidence,
                regex: primary_regex,
            },
            secondary_patterns,
            sequence_patterns,
            context_extraction: pattern.context_extraction,
        })
    }
}

/// An immutable, read-only view over all loaded patterns.
pub struct PatternRegistry {
    patterns: Vec<CompiledPattern>,
    library_ids: Vec<String>,
}

impl PatternRegistry {
    /// Build a registry directly from already-parsed pattern sets. Useful
    /// for tests and for callers that source pattern sets some other way
    /// than `load_directory`.
    pub fn from_pattern_sets(sets: Vec<PatternSet>) -> Result<Self, PatternLoadError> {
        let mut patterns = Vec::new();
        let mut library_ids = Vec::new();
        let mut seen_ids = HashSet::new();

        for set in sets {
            library_ids.push(set.metadata.library_id.clone());
            for pattern in set.patterns {
                if !seen_ids.insert(pattern.id.clone()) {
                    return Err(PatternLoadError::DuplicateId(pattern.id));
                }
                match CompiledPattern::compile(pattern, &set.metadata.library_id) {
                    Ok(compiled) => patterns.push(compiled),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping pattern with invalid regex");
                    }
                }
            }
        }

        if patterns.is_empty() {
            return Err(PatternLoadError::NoPatternsLoaded(
                "no valid patterns in supplied pattern sets".to_string(),
            ));
        }

        Ok(PatternRegistry {
            patterns,
            library_ids,
        })
    }

    /// Load every `*.yaml`/`*.yml` file in `dir`, in lexicographic (directory)
    /// order. A file that fails to parse is skipped with a warning; the
    /// count of files actually loaded is what ends up in the registry.
    /// Fails only if zero patterns load across the whole directory.
    pub fn load_directory<P: AsRef<Path>>(dir: P) -> Result<Self, PatternLoadError> {
        let dir = dir.as_ref();
        let mut entries: Vec<_> = fs::read_dir(dir)
            .map_err(|source| PatternLoadError::Io {
                path: dir.display().to_string(),
                source,
            })?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
            })
            .collect();
        entries.sort();

        let mut patterns = Vec::new();
        let mut library_ids = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut loaded_files = 0usize;

        for path in entries {
            let path_str = path.display().to_string();
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(path = %path_str, error = %e, "failed to read pattern file");
                    continue;
                }
            };

            let set: PatternSet = match serde_yaml::from_str(&content) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(path = %path_str, error = %e, "failed to parse pattern file");
                    continue;
                }
            };

            library_ids.push(set.metadata.library_id.clone());
            for pattern in set.patterns {
                if !seen_ids.insert(pattern.id.clone()) {
                    tracing::warn!(pattern_id = %pattern.id, "duplicate pattern id, skipping");
                    continue;
                }
                match CompiledPattern::compile(pattern, &set.metadata.library_id) {
                    Ok(compiled) => patterns.push(compiled),
                    Err(e) => {
                        tracing::warn!(path = %path_str, error = %e, "skipping invalid pattern");
                    }
                }
            }
            loaded_files += 1;
        }

        if patterns.is_empty() {
            return Err(PatternLoadError::NoPatternsLoaded(dir.display().to_string()));
        }

        tracing::debug!(loaded_files, total_patterns = patterns.len(), "pattern registry loaded");

        Ok(PatternRegistry {
            patterns,
            library_ids,
        })
    }

    /// A stable, read-only view over every loaded pattern, in registration
    /// order (the order match discovery iterates them in).
    pub fn patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Unique `library_id`s in first-seen order.
    pub fn library_ids(&self) -> &[String] {
        &self.library_ids
    }

    pub fn get(&self, id: &str) -> Option<&CompiledPattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
