//! Matching engine for pattern-guard
//!
//! Walks the effective rule list for one action request and reports the
//! first rule that fires. Rule defects (bad regex, failing predicate) are
//! logged and cost only the rule that has them.

pub mod matcher;
pub mod predicate;

use std::env;

use tracing::{debug, error, warn};

use crate::input::ActionRequest;
use crate::output::Decision;
use crate::rules::merge::EffectiveRuleSet;

use matcher::{CompiledRule, RuleOutcome};
use predicate::{PredicateRunner, ProcessPredicate};

/// Operating mode, applied on top of the pure evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Decisions are rendered as evaluated
    #[default]
    Enforce,

    /// A matched `block` is downgraded to `warn`
    WarnOnly,

    /// Nothing is evaluated; every request is a no-match
    Disabled,
}

impl Mode {
    /// Mode requested through `PATTERN_GUARD_DISABLED` / `PATTERN_GUARD_WARN_ONLY`
    pub fn from_env() -> Self {
        if env::var_os("PATTERN_GUARD_DISABLED").is_some() {
            Mode::Disabled
        } else if env::var_os("PATTERN_GUARD_WARN_ONLY").is_some() {
            Mode::WarnOnly
        } else {
            Mode::Enforce
        }
    }
}

/// The rule engine
pub struct RuleEngine<P = ProcessPredicate> {
    rules: Vec<CompiledRule>,
    predicates: P,
    mode: Mode,
}

impl<P: PredicateRunner> RuleEngine<P> {
    /// Compile the rule set. Rules with invalid patterns are dropped.
    pub fn new(rules: EffectiveRuleSet, predicates: P) -> Self {
        let rules = rules
            .into_iter()
            .filter_map(|scoped| match CompiledRule::compile(scoped) {
                Ok(compiled) => Some(compiled),
                Err(err) => {
                    error!(error = %err, "skipping rule");
                    None
                }
            })
            .collect();

        Self {
            rules,
            predicates,
            mode: Mode::Enforce,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Compiled rules in evaluation order
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn predicates(&self) -> &P {
        &self.predicates
    }

    /// First-match-wins evaluation of one request
    pub fn evaluate(&self, request: &ActionRequest) -> Decision {
        for compiled in &self.rules {
            let rule = compiled.rule();

            if !rule.enabled || !rule.applies_to(request.trigger_event, &request.target_class) {
                continue;
            }

            match compiled.test(&request.candidate_text, &self.predicates) {
                RuleOutcome::Triggered => {
                    debug!(
                        rule_id = %rule.id,
                        scope = %compiled.scope(),
                        action = %rule.action,
                        "rule triggered"
                    );
                    return Decision::matched(rule);
                }
                RuleOutcome::PredicateFailed(err) => {
                    warn!(rule_id = %rule.id, error = %err, "predicate failed, skipping rule");
                }
                outcome => {
                    debug!(rule_id = %rule.id, reason = %outcome.describe(), "rule skipped");
                }
            }
        }

        Decision::NoMatch
    }

    /// Evaluate with the operating mode applied
    pub fn check(&self, request: &ActionRequest) -> Decision {
        match self.mode {
            Mode::Disabled => Decision::NoMatch,
            Mode::Enforce => self.evaluate(request),
            Mode::WarnOnly => self.evaluate(request).downgrade_block(),
        }
    }
}
