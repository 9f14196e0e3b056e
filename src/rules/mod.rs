//! Rule record model for pattern-guard
//!
//! A rule pairs a condition (regex pattern, exclusion pattern, external
//! predicate) with the action to take when an agent action satisfies it.
//! Rules are authored outside the engine and are read-only once loaded.

pub mod merge;
pub mod store;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RuleError;

/// Which collection a rule was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// User-wide rules, applied in every project
    Wide,

    /// Project-local rules, applied only in the current project
    Narrow,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Wide => "wide",
            Scope::Narrow => "narrow",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of host execution a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum TriggerEvent {
    /// Before a tool runs (shell command, file write/edit)
    PreAction,

    /// After a tool has run
    PostAction,

    /// When the user submits a prompt
    PromptSubmitted,
}

impl TriggerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerEvent::PreAction => "pre-action",
            TriggerEvent::PostAction => "post-action",
            TriggerEvent::PromptSubmitted => "prompt-submitted",
        }
    }
}

impl FromStr for TriggerEvent {
    type Err = RuleError;

    /// Accepts the generic names as well as the native event names used by
    /// Claude Code and Cursor hook registrations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pre-action" | "pretooluse" | "beforeshellexecution" => Ok(TriggerEvent::PreAction),
            "post-action" | "posttooluse" | "aftershellexecution" | "afterfileedit" => {
                Ok(TriggerEvent::PostAction)
            }
            "prompt-submitted" | "userpromptsubmit" | "beforesubmitprompt" => {
                Ok(TriggerEvent::PromptSubmitted)
            }
            _ => Err(RuleError::UnknownTriggerEvent(s.to_string())),
        }
    }
}

impl TryFrom<String> for TriggerEvent {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the host should do when a rule triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Refuse the action
    Block,

    /// Let the action through with an advisory message
    Warn,

    /// Ask the user to confirm (pre-action only)
    Ask,
}

impl Action {
    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Some(Action::Block),
            "warn" => Some(Action::Warn),
            "ask" => Some(Action::Ask),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Block => "block",
            Action::Warn => "warn",
            Action::Ask => "ask",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of agent action, e.g. `shell-exec` or `file-write`
///
/// Host tool names are canonicalised on construction, so `Bash` and
/// `shell-exec` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TargetClass(String);

impl TargetClass {
    pub const ANY: &'static str = "any";

    pub fn new(name: &str) -> Self {
        let lower = name.trim().to_ascii_lowercase();
        let canonical = match lower.as_str() {
            "bash" | "shell" | "shell-exec" => "shell-exec",
            "write" | "file-write" => "file-write",
            "edit" | "multiedit" | "file-edit" => "file-edit",
            "read" | "file-read" => "file-read",
            "" | "*" | "any" => Self::ANY,
            _ => return TargetClass(lower),
        };
        TargetClass(canonical.to_string())
    }

    pub fn any() -> Self {
        TargetClass(Self::ANY.to_string())
    }

    pub fn is_any(&self) -> bool {
        self.0 == Self::ANY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which target classes a rule inspects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelector {
    Any,
    OneOf(Vec<TargetClass>),
}

impl TargetSelector {
    /// Parse a selector such as `Bash`, `Write|Edit`, `*` or nothing at all
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return TargetSelector::Any;
        };

        // `Bash|` is a typo for `Bash`, not a wildcard
        let classes: Vec<TargetClass> = raw
            .split('|')
            .filter(|name| !name.trim().is_empty())
            .map(TargetClass::new)
            .collect();
        if classes.is_empty() || classes.iter().any(TargetClass::is_any) {
            TargetSelector::Any
        } else {
            TargetSelector::OneOf(classes)
        }
    }

    pub fn selects(&self, target: &TargetClass) -> bool {
        match self {
            TargetSelector::Any => true,
            TargetSelector::OneOf(classes) => classes.contains(target),
        }
    }
}

impl fmt::Display for TargetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSelector::Any => f.write_str("*"),
            TargetSelector::OneOf(classes) => {
                let names: Vec<&str> = classes.iter().map(TargetClass::as_str).collect();
                f.write_str(&names.join("|"))
            }
        }
    }
}

/// The test a rule applies to the candidate text
///
/// Only these four shapes exist; a rule with an exclusion but nothing to
/// exclude from cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    PatternOnly {
        pattern: String,
    },
    PatternWithExclude {
        pattern: String,
        exclude: String,
    },
    PredicateOnly {
        predicate: String,
    },
    /// Pattern match gated by a predicate (and optionally an exclusion)
    PatternWithPredicate {
        pattern: String,
        exclude: Option<String>,
        predicate: String,
    },
}

impl Condition {
    /// Build a condition from the optional fields of a rule record
    pub fn from_parts(
        rule_id: &str,
        pattern: Option<String>,
        exclude: Option<String>,
        predicate: Option<String>,
    ) -> Result<Self, RuleError> {
        match (pattern, exclude, predicate) {
            (Some(pattern), None, None) => Ok(Condition::PatternOnly { pattern }),
            (Some(pattern), Some(exclude), None) => {
                Ok(Condition::PatternWithExclude { pattern, exclude })
            }
            (Some(pattern), exclude, Some(predicate)) => Ok(Condition::PatternWithPredicate {
                pattern,
                exclude,
                predicate,
            }),
            (None, exclude, Some(predicate)) => {
                if exclude.is_some() {
                    warn!(rule_id, "exclude_pattern ignored on a predicate-only rule");
                }
                Ok(Condition::PredicateOnly { predicate })
            }
            (None, _, None) => Err(RuleError::MissingCondition {
                rule_id: rule_id.to_string(),
            }),
        }
    }

    pub fn pattern(&self) -> Option<&str> {
        match self {
            Condition::PatternOnly { pattern }
            | Condition::PatternWithExclude { pattern, .. }
            | Condition::PatternWithPredicate { pattern, .. } => Some(pattern),
            Condition::PredicateOnly { .. } => None,
        }
    }

    pub fn exclude(&self) -> Option<&str> {
        match self {
            Condition::PatternWithExclude { exclude, .. } => Some(exclude),
            Condition::PatternWithPredicate { exclude, .. } => exclude.as_deref(),
            _ => None,
        }
    }

    pub fn predicate(&self) -> Option<&str> {
        match self {
            Condition::PredicateOnly { predicate }
            | Condition::PatternWithPredicate { predicate, .. } => Some(predicate),
            _ => None,
        }
    }
}

/// A single detection rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Identity key; a narrow rule overrides a wide rule with the same id
    pub id: String,

    /// Human-readable summary, never evaluated
    pub description: String,

    pub trigger_event: TriggerEvent,

    pub target: TargetSelector,

    pub condition: Condition,

    pub action: Action,

    /// Rationale and alternative, shown or injected when the rule triggers
    pub message: String,

    pub enabled: bool,
}

pub const DEFAULT_MESSAGE: &str = "Pattern matched";

impl Rule {
    /// Create an enabled rule that applies to every target class
    pub fn new(
        id: impl Into<String>,
        trigger_event: TriggerEvent,
        condition: Condition,
        action: Action,
    ) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            trigger_event,
            target: TargetSelector::Any,
            condition,
            action,
            message: DEFAULT_MESSAGE.to_string(),
            enabled: true,
        }
    }

    pub fn with_target(mut self, selector: &str) -> Self {
        self.target = TargetSelector::parse(Some(selector));
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether this rule inspects the given phase and target class.
    /// Does not consider `enabled`.
    pub fn applies_to(&self, event: TriggerEvent, target: &TargetClass) -> bool {
        self.trigger_event == event && self.target.selects(target)
    }
}

/// On-disk form of a rule, as stored in a rule document
///
/// Legacy field names from earlier rule files are accepted as aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: String,

    #[serde(default)]
    pub description: String,

    #[serde(alias = "hook")]
    pub trigger_event: TriggerEvent,

    #[serde(default, alias = "matcher", skip_serializing_if = "Option::is_none")]
    pub target_class: Option<String>,

    /// Post-action rules from earlier files kept theirs in `file_pattern`
    #[serde(
        default,
        alias = "pattern",
        alias = "file_pattern",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_pattern: Option<String>,

    #[serde(default, alias = "check_script", skip_serializing_if = "Option::is_none")]
    pub predicate_ref: Option<String>,

    /// Kept as a string so an unknown action is reported as such
    #[serde(default = "default_action")]
    pub action: String,

    #[serde(default = "default_message")]
    pub message: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_action() -> String {
    Action::Warn.as_str().to_string()
}

fn default_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

fn default_enabled() -> bool {
    true
}

/// Treat empty strings as absent
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<RuleRecord> for Rule {
    type Error = RuleError;

    fn try_from(record: RuleRecord) -> Result<Self, Self::Error> {
        let action = Action::parse(&record.action).ok_or_else(|| RuleError::UnknownAction {
            rule_id: record.id.clone(),
            action: record.action.clone(),
        })?;

        let condition = Condition::from_parts(
            &record.id,
            non_empty(record.primary_pattern),
            non_empty(record.exclude_pattern),
            non_empty(record.predicate_ref),
        )?;

        let message = if record.message.trim().is_empty() {
            default_message()
        } else {
            record.message
        };

        Ok(Rule {
            target: TargetSelector::parse(non_empty(record.target_class).as_deref()),
            id: record.id,
            description: record.description,
            trigger_event: record.trigger_event,
            condition,
            action,
            message,
            enabled: record.enabled,
        })
    }
}
