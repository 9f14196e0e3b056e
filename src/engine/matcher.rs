//! Per-rule matching
//!
//! A `CompiledRule` holds a rule with its regexes built, and decides whether
//! the rule fires for one candidate text.

use regex::{Regex, RegexBuilder};

use crate::engine::predicate::PredicateRunner;
use crate::error::{PredicateError, RuleError};
use crate::rules::merge::ScopedRule;
use crate::rules::{Condition, Rule, Scope, TriggerEvent};

/// Result of testing one rule's condition against one candidate
#[derive(Debug)]
pub enum RuleOutcome {
    /// The rule fires
    Triggered,

    /// The primary pattern did not match
    PatternMiss,

    /// The primary pattern matched but the exclusion pattern suppressed it
    Excluded,

    /// The predicate reported its condition as not met
    PredicateNotMet,

    /// The predicate could not be run; the rule is treated as not firing
    PredicateFailed(PredicateError),
}

impl RuleOutcome {
    pub fn is_triggered(&self) -> bool {
        matches!(self, RuleOutcome::Triggered)
    }

    /// Short human-readable explanation
    pub fn describe(&self) -> String {
        match self {
            RuleOutcome::Triggered => "rule triggered".to_string(),
            RuleOutcome::PatternMiss => "input does not match the pattern".to_string(),
            RuleOutcome::Excluded => "input matches the exclude pattern".to_string(),
            RuleOutcome::PredicateNotMet => "predicate exited 0 (condition not met)".to_string(),
            RuleOutcome::PredicateFailed(err) => format!("predicate failed: {}", err),
        }
    }
}

#[derive(Debug)]
enum Gate {
    Pattern {
        primary: Regex,
        exclude: Option<Regex>,
        predicate: Option<String>,
    },
    Predicate(String),
}

/// A rule ready for evaluation
#[derive(Debug)]
pub struct CompiledRule {
    scope: Scope,
    rule: Rule,
    gate: Gate,
}

fn compile(rule: &Rule, field: &'static str, pattern: &str) -> Result<Regex, RuleError> {
    // Prompt text is free-form prose, so prompt rules ignore case
    RegexBuilder::new(pattern)
        .case_insensitive(rule.trigger_event == TriggerEvent::PromptSubmitted)
        .build()
        .map_err(|source| RuleError::PatternCompile {
            rule_id: rule.id.clone(),
            field,
            source,
        })
}

impl CompiledRule {
    /// Build the rule's regexes. Fails only on an invalid pattern.
    pub fn compile(scoped: ScopedRule) -> Result<Self, RuleError> {
        let ScopedRule { scope, rule } = scoped;

        let gate = match &rule.condition {
            Condition::PredicateOnly { predicate } => Gate::Predicate(predicate.clone()),
            condition => {
                let primary = match condition.pattern() {
                    Some(pattern) => compile(&rule, "primary_pattern", pattern)?,
                    None => {
                        return Err(RuleError::MissingCondition {
                            rule_id: rule.id.clone(),
                        })
                    }
                };
                let exclude = condition
                    .exclude()
                    .map(|pattern| compile(&rule, "exclude_pattern", pattern))
                    .transpose()?;
                Gate::Pattern {
                    primary,
                    exclude,
                    predicate: condition.predicate().map(str::to_string),
                }
            }
        };

        Ok(Self { scope, rule, gate })
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Test the condition against a candidate text
    ///
    /// Does not look at `enabled`, trigger event or target class; callers
    /// filter on those first.
    pub fn test(&self, candidate: &str, predicates: &dyn PredicateRunner) -> RuleOutcome {
        match &self.gate {
            Gate::Predicate(predicate) => run_predicate(predicate, candidate, predicates),
            Gate::Pattern {
                primary,
                exclude,
                predicate,
            } => {
                if !primary.is_match(candidate) {
                    return RuleOutcome::PatternMiss;
                }
                if exclude.as_ref().is_some_and(|re| re.is_match(candidate)) {
                    return RuleOutcome::Excluded;
                }
                match predicate {
                    Some(predicate) => run_predicate(predicate, candidate, predicates),
                    None => RuleOutcome::Triggered,
                }
            }
        }
    }
}

fn run_predicate(
    predicate: &str,
    candidate: &str,
    predicates: &dyn PredicateRunner,
) -> RuleOutcome {
    match predicates.run(predicate, candidate) {
        Ok(true) => RuleOutcome::Triggered,
        Ok(false) => RuleOutcome::PredicateNotMet,
        Err(err) => RuleOutcome::PredicateFailed(err),
    }
}
