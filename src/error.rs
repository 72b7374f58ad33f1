//! Crate-wide error types.
//!
//! Each module that can fail owns a narrow `thiserror` enum; [`FingerprintError`]
//! wraps them for callers that want a single top-level error to propagate with `?`.

use thiserror::Error;

/// Errors raised while validating or compiling a raw rule set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuleError {
    #[error("rule at index {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("duplicate rule id `{id}`")]
    DuplicateId { id: String },

    #[error("rule `{id}` has an unparseable `{field}` regex: {source}")]
    BadRegex {
        id: String,
        field: &'static str,
        source: String,
    },

    #[error("rule `{id}` has a CPE that does not start with `cpe:2.3:`")]
    BadCpePrefix { id: String },

    #[error("rule `{id}` has pattern_strength {value} outside [0.0, 1.0]")]
    BadPatternStrength { id: String, value: f32 },

    #[error("rule `{id}` has bonus port {port} outside [1, 65535]")]
    BadBonusPort { id: String, port: u32 },
}

/// Errors raised while loading or parsing a rule/probe catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("probe group `{id}` has no probes")]
    EmptyProbeGroup { id: String },

    #[error("probe `{id}` is missing required field `{field}`")]
    InvalidProbe { id: String, field: &'static str },
}

/// Errors raised by the multi-fingerprinter probe coordinator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoordinatorError {
    #[error("fingerprinter `{fingerprinter}` failed during passive analysis: {source}")]
    PassiveAnalysis {
        fingerprinter: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("fingerprinter `{fingerprinter}` failed verifying probe `{probe}`: {source}")]
    Verify {
        fingerprinter: String,
        probe: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("probe executor failed for fingerprinter `{fingerprinter}`, probe `{probe}`: {source}")]
    ProbeExecution {
        fingerprinter: String,
        probe: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Errors raised while running the validation harness.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("validation run was cancelled before completion")]
    Cancelled,

    #[error("validation run exceeded its global timeout")]
    TimedOut,

    #[error("invalid validation configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised while constructing or validating ambient settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{field} must be in [0.0, 1.0], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },

    #[error("{field} must be >= 1, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("failed to load configuration: {0}")]
    Load(String),
}

/// Top-level crate error, used where a caller wants a single `Result` type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FingerprintError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The normal negative outcome of `resolve` — not a failure of the resolver itself.
    #[error("no rule produced a surviving candidate for this input")]
    NoMatch,
}
