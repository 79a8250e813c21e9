//! Keyword-weight map for Context Scorer Variant B
//!
//! Loaded once from a directory of JSON files shaped
//! `{category: {keyword: weight}}` and flattened into a single
//! `keyword -> weight` map. Immutable after load; concurrent readers need
//! no synchronization.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::KeywordLoadError;

/// A flattened, immutable keyword -> weight map.
#[derive(Debug, Clone, Default)]
pub struct KeywordWeights {
    weights: HashMap<String, f64>,
}

impl KeywordWeights {
    pub fn empty() -> Self {
        KeywordWeights {
            weights: HashMap::new(),
        }
    }

    /// Load and merge every `*.json` file in `dir`, in directory order.
    /// On a conflicting weight for the same keyword across files, the
    /// first-loaded value wins and a warning is emitted. A missing
    /// directory or unparseable file does not abort the load: the engine
    /// proceeds with whatever weights did load.
    pub fn load_directory<P: AsRef<Path>>(dir: P) -> Result<Self, KeywordLoadError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Err(KeywordLoadError::MissingDirectory(dir.display().to_string()));
        }

        let mut entries: Vec<_> = fs::read_dir(dir)
            .map_err(|source| KeywordLoadError::Io {
                path: dir.display().to_string(),
                source,
            })?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        entries.sort();

        let mut weights = HashMap::new();
        for path in entries {
            let path_str = path.display().to_string();
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(path = %path_str, error = %e, "failed to read keyword file");
                    continue;
                }
            };

            // Parsed as `BTreeMap`s rather than `HashMap`s so that a keyword
            // appearing under two categories in the *same* file resolves in
            // deterministic (category-name, then keyword-name) order instead
            // of hash-iteration order, matching the engine's overall
            // determinism requirement.
            let parsed: std::collections::BTreeMap<String, std::collections::BTreeMap<String, f64>> =
                match serde_json::from_str(&content) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(path = %path_str, error = %e, "failed to parse keyword file");
                        continue;
                    }
                };

            for (_category, keyword_map) in parsed {
                for (keyword, weight) in keyword_map {
                    if let std::collections::hash_map::Entry::Vacant(entry) = weights.entry(keyword.clone())
                    {
                        entry.insert(weight);
                    } else {
                        tracing::warn!(
                            keyword = %keyword,
                            path = %path_str,
                            "conflicting keyword weight, keeping first-loaded value"
                        );
                    }
                }
            }
        }

        Ok(KeywordWeights { weights })
    }

    /// Build directly from a flat map, bypassing file I/O. Used by tests and
    /// by callers that source weights some other way.
    pub fn from_map(weights: HashMap<String, f64>) -> Self {
        KeywordWeights { weights }
    }

    pub fn get(&self, keyword: &str) -> Option<f64> {
        self.weights.get(keyword).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_weights_have_no_entries() {
        let weights = KeywordWeights::empty();
        assert!(weights.is_empty());
        assert_eq!(weights.get("ERROR"), None);
    }

    #[test]
    fn from_map_round_trips() {
        let mut map = HashMap::new();
        map.insert("timeout".to_string(), 0.5);
        let weights = KeywordWeights::from_map(map);
        assert_eq!(weights.get("timeout"), Some(0.5));
        assert_eq!(weights.len(), 1);
    }

    #[test]
    fn a_keyword_repeated_across_categories_in_one_file_resolves_deterministically() {
        let dir = std::env::temp_dir().join(format!(
            "podmortem-keywords-test-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("weights.json");
        // "timeout" appears under both "network" and "storage"; category
        // iteration is a BTreeMap, so "network" (sorts first) must win
        // every time, not whichever HashMap happened to iterate first.
        fs::write(
            &file,
            r#"{"storage": {"timeout": 0.9}, "network": {"timeout": 0.3}}"#,
        )
        .unwrap();

        for _ in 0..5 {
            let weights = KeywordWeights::load_directory(&dir).unwrap();
            assert_eq!(weights.get("timeout"), Some(0.3));
        }

        fs::remove_dir_all(&dir).ok();
    }
}
