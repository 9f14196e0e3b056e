//! Rule store: loads one rule collection per scope
//!
//! Loading never fails. A missing, unreadable or malformed document yields an
//! empty collection and a logged warning, so the host action proceeds. A
//! document that is half-written by a concurrent editor falls in the same
//! bucket and is simply read again on the next invocation.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ConfigError, RuleError};
use crate::rules::merge::{merge, EffectiveRuleSet};
use crate::rules::{Rule, RuleRecord, Scope};

/// Rule document schema version written by current tooling
pub const SCHEMA_VERSION: &str = "1.0";

/// One rule document as stored on disk
#[derive(Debug, Deserialize)]
pub struct RuleDocument {
    #[serde(default = "default_version")]
    pub version: String,

    /// Entries are decoded one at a time so a bad entry only loses itself
    #[serde(default, alias = "patterns")]
    pub rules: Vec<serde_json::Value>,
}

fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// An ordered list of rules loaded from a single scope
#[derive(Debug, Clone)]
pub struct RuleCollection {
    pub scope: Scope,

    /// File the collection was read from, if any
    pub source: Option<PathBuf>,

    pub rules: Vec<Rule>,
}

impl RuleCollection {
    pub fn new(scope: Scope, rules: Vec<Rule>) -> Self {
        Self {
            scope,
            source: None,
            rules,
        }
    }

    pub fn empty(scope: Scope) -> Self {
        Self::new(scope, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}

/// Parse a rule document, dropping entries that do not decode
pub fn parse_collection(
    text: &str,
    scope: Scope,
    source: Option<&Path>,
) -> Result<RuleCollection, serde_json::Error> {
    let document: RuleDocument = serde_json::from_str(text)?;

    if document.version.split('.').next() != Some("1") {
        warn!(
            %scope,
            version = %document.version,
            "unsupported rule document version, reading anyway"
        );
    }

    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(document.rules.len());

    for (index, value) in document.rules.into_iter().enumerate() {
        let rule = match decode_rule(index, value) {
            Ok(rule) => rule,
            Err(err) => {
                warn!(%scope, error = %err, "skipping rule");
                continue;
            }
        };

        if !seen.insert(rule.id.clone()) {
            let err = RuleError::DuplicateId { rule_id: rule.id };
            warn!(%scope, error = %err, "dropping later duplicate");
            continue;
        }

        rules.push(rule);
    }

    Ok(RuleCollection {
        scope,
        source: source.map(Path::to_path_buf),
        rules,
    })
}

fn decode_rule(index: usize, value: serde_json::Value) -> Result<Rule, RuleError> {
    let record: RuleRecord = serde_json::from_value(value)
        .map_err(|source| RuleError::InvalidRecord { index, source })?;
    Rule::try_from(record)
}

/// Read and parse a rule document, reporting why it could not be used
pub fn read_collection(path: &Path, scope: Scope) -> Result<RuleCollection, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    parse_collection(&text, scope, Some(path)).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Knows where the wide and narrow rule documents live
#[derive(Debug, Clone)]
pub struct RuleStore {
    wide: PathBuf,
    narrow: PathBuf,
}

impl RuleStore {
    pub fn new(wide: impl Into<PathBuf>, narrow: impl Into<PathBuf>) -> Self {
        Self {
            wide: wide.into(),
            narrow: narrow.into(),
        }
    }

    pub fn path(&self, scope: Scope) -> &Path {
        match scope {
            Scope::Wide => &self.wide,
            Scope::Narrow => &self.narrow,
        }
    }

    /// Load the collection for one scope, or an empty one if it is unusable
    pub fn load(&self, scope: Scope) -> RuleCollection {
        let path = self.path(scope);

        match read_collection(path, scope) {
            Ok(collection) => {
                debug!(%scope, path = %path.display(), rules = collection.len(), "loaded rules");
                collection
            }
            Err(ConfigError::Load { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!(%scope, path = %path.display(), "no rule file");
                RuleCollection::empty(scope)
            }
            Err(err) => {
                warn!(%scope, error = %err, "ignoring rule file");
                RuleCollection::empty(scope)
            }
        }
    }

    /// Load both scopes and merge them
    pub fn load_effective(&self) -> EffectiveRuleSet {
        merge(self.load(Scope::Wide), self.load(Scope::Narrow))
    }

    /// Directories holding the rule files, narrow scope first
    pub fn rule_dirs(&self) -> Vec<PathBuf> {
        [&self.narrow, &self.wide]
            .into_iter()
            .filter_map(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .collect()
    }
}
