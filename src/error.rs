//! Error types for pattern-guard
//!
//! Every error here is recovered locally by the caller: a bad file becomes an
//! empty collection, a bad rule is skipped, a failed predicate skips its rule.
//! Only `InputError` escapes to the process boundary.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure to read a rule document or the engine configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A defect in a single rule. The rule is skipped, the rest are unaffected.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule entry #{index} is malformed: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("rule '{rule_id}' declares unknown action '{action}' (expected block, warn or ask)")]
    UnknownAction { rule_id: String, action: String },

    #[error("unknown trigger event '{0}'")]
    UnknownTriggerEvent(String),

    #[error("rule '{rule_id}' has neither a pattern nor a predicate")]
    MissingCondition { rule_id: String },

    #[error("rule '{rule_id}' has an invalid {field}: {source}")]
    PatternCompile {
        rule_id: String,
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("rule id '{rule_id}' appears more than once in the same collection")]
    DuplicateId { rule_id: String },
}

/// Failure to obtain an answer from an external predicate
#[derive(Debug, Error)]
pub enum PredicateError {
    #[error("predicate reference is empty")]
    EmptyCommand,

    #[error("predicate reference '{0}' is not valid shell words")]
    Parse(String),

    #[error("failed to spawn predicate '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait on predicate '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("predicate '{program}' timed out after {}ms", timeout.as_millis())]
    Timeout { program: String, timeout: Duration },

    #[error("predicate '{program}' was terminated by a signal")]
    Terminated { program: String },
}

/// The hook request on stdin could not be understood
#[derive(Debug, Error)]
pub enum InputError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("hook input must be a JSON object")]
    NotAnObject,

    #[error("could not determine the trigger event of the hook input")]
    MissingEvent,

    #[error("unknown trigger event '{0}'")]
    UnknownEvent(String),

    #[error("unknown host protocol '{0}' (expected claude or cursor)")]
    UnknownProtocol(String),
}
