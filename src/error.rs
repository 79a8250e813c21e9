//! Error taxonomy for the pattern engine
//!
//! Mirrors the split in the original pattern engine: library code returns
//! `thiserror`-derived enums, `anyhow` is reserved for the CLI boundary.

use thiserror::Error;

/// Errors raised while loading and validating pattern definitions
#[derive(Error, Debug)]
pub enum PatternLoadError {
    #[error("failed to read pattern file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pattern file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("pattern {pattern_id} in {path} has an invalid regex: {source}")]
    InvalidRegex {
        path: String,
        pattern_id: String,
        #[source]
        source: regex::Error,
    },

    #[error("duplicate pattern id '{0}' across loaded pattern sets")]
    DuplicateId(String),

    #[error("no patterns could be loaded from {0}")]
    NoPatternsLoaded(String),
}

/// Errors raised while loading keyword-weight files
#[derive(Error, Debug)]
pub enum KeywordLoadError {
    #[error("failed to read keyword file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse keyword file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("keywords directory {0} does not exist")]
    MissingDirectory(String),
}

/// Errors raised by the analysis orchestrator when the input itself is unusable
#[derive(Error, Debug)]
pub enum InvalidInputError {
    #[error("logs field is missing from the pod failure payload")]
    MissingLogs,

    #[error("pod metadata is missing from the pod failure payload")]
    MissingPod,
}

/// Umbrella error returned by `AnalysisOrchestrator::analyze`
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
}
