//! Rule test and simulation harness
//!
//! Lets a rule author ask "would this rule fire on that input?" and "what
//! would the hook do with this command?" without registering anything with
//! a host. Simulation walks the same compiled rules in the same order as
//! `RuleEngine::evaluate`, so its first match is the engine's decision.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::engine::matcher::CompiledRule;
use crate::engine::predicate::PredicateRunner;
use crate::engine::RuleEngine;
use crate::input::ActionRequest;
use crate::rules::merge::EffectiveRuleSet;
use crate::rules::{Action, Scope, TargetClass, TriggerEvent};

/// Result of testing a single rule against an input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleTestReport {
    pub rule_id: String,

    pub matched: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Why the rule did not fire
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RuleTestReport {
    fn miss(rule_id: &str, scope: Option<Scope>, reason: String) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            matched: false,
            scope,
            action: None,
            message: None,
            reason: Some(reason),
        }
    }
}

impl fmt::Display for RuleTestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.matched {
            writeln!(f, "Rule '{}' WOULD match", self.rule_id)?;
            if let Some(action) = self.action {
                writeln!(f, "  Action: {}", action)?;
            }
            if let Some(message) = &self.message {
                writeln!(f, "  Message: {}", message)?;
            }
        } else {
            writeln!(f, "Rule '{}' would NOT match", self.rule_id)?;
            if let Some(reason) = &self.reason {
                writeln!(f, "  Reason: {}", reason)?;
            }
        }
        Ok(())
    }
}

/// Test one rule against an input, under the rule's own trigger event
///
/// Works on the uncompiled rule set so that a rule with an invalid pattern
/// can be reported as such instead of silently missing.
pub fn test_rule(
    rules: &EffectiveRuleSet,
    rule_id: &str,
    input: &str,
    target: Option<&str>,
    predicates: &dyn PredicateRunner,
) -> RuleTestReport {
    let Some(scoped) = rules.get(rule_id) else {
        return RuleTestReport::miss(rule_id, None, format!("rule '{}' not found", rule_id));
    };
    let rule = &scoped.rule;
    let scope = Some(scoped.scope);

    if !rule.enabled {
        return RuleTestReport::miss(rule_id, scope, format!("rule '{}' is disabled", rule_id));
    }

    if let Some(target) = target {
        let class = TargetClass::new(target);
        if !rule.target.selects(&class) {
            return RuleTestReport::miss(
                rule_id,
                scope,
                format!("rule targets '{}', not '{}'", rule.target, class),
            );
        }
    }

    let compiled = match CompiledRule::compile(scoped.clone()) {
        Ok(compiled) => compiled,
        Err(err) => return RuleTestReport::miss(rule_id, scope, err.to_string()),
    };

    let outcome = compiled.test(input, predicates);
    if outcome.is_triggered() {
        RuleTestReport {
            rule_id: rule_id.to_string(),
            matched: true,
            scope,
            action: Some(rule.action),
            message: Some(rule.message.clone()),
            reason: None,
        }
    } else {
        RuleTestReport::miss(rule_id, scope, outcome.describe())
    }
}

/// A rule that would fire during a simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggeredRule {
    pub rule_id: String,
    pub scope: Scope,
    pub action: Action,
    pub message: String,
}

/// What the hook would do with one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub candidate_text: String,
    pub trigger_event: TriggerEvent,
    pub target_class: TargetClass,

    /// Enabled rules whose trigger event and target apply
    pub rules_checked: usize,

    /// Every applicable rule that fires, in evaluation order
    pub triggered: Vec<TriggeredRule>,

    /// The rule the engine would report
    pub first_match: Option<TriggeredRule>,

    pub would_block: bool,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulating: {}", self.candidate_text)?;
        writeln!(f, "Event: {}  Target: {}", self.trigger_event, self.target_class)?;
        writeln!(f, "Rules checked: {}", self.rules_checked)?;
        writeln!(f)?;

        match &self.first_match {
            Some(first) => {
                writeln!(f, "Rule WOULD trigger: {} ({})", first.rule_id, first.scope)?;
                writeln!(f, "  Action: {}", first.action)?;
                writeln!(f, "  Message: {}", first.message)?;
                for shadowed in self.triggered.iter().skip(1) {
                    writeln!(f, "  Also matches: {}", shadowed.rule_id)?;
                }
                writeln!(f)?;
                if self.would_block {
                    writeln!(f, "Result: would be BLOCKED")
                } else {
                    writeln!(f, "Result: would be ALLOWED (with {})", first.action)
                }
            }
            None => {
                writeln!(f, "No rules matched")?;
                writeln!(f, "Result: would be ALLOWED")
            }
        }
    }
}

/// Evaluate every applicable rule against a request
pub fn simulate<P: PredicateRunner>(
    engine: &RuleEngine<P>,
    request: &ActionRequest,
) -> SimulationReport {
    let mut rules_checked = 0;
    let mut triggered = Vec::new();

    for compiled in engine.rules() {
        let rule = compiled.rule();
        if !rule.enabled || !rule.applies_to(request.trigger_event, &request.target_class) {
            continue;
        }
        rules_checked += 1;

        if compiled
            .test(&request.candidate_text, engine.predicates())
            .is_triggered()
        {
            triggered.push(TriggeredRule {
                rule_id: rule.id.clone(),
                scope: compiled.scope(),
                action: rule.action,
                message: rule.message.clone(),
            });
        }
    }

    let first_match = triggered.first().cloned();
    let would_block = first_match
        .as_ref()
        .is_some_and(|first| first.action == Action::Block);

    SimulationReport {
        candidate_text: request.candidate_text.clone(),
        trigger_event: request.trigger_event,
        target_class: request.target_class.clone(),
        rules_checked,
        triggered,
        first_match,
        would_block,
    }
}

/// Totals over many simulated inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub would_allow: usize,
    pub would_block: usize,

    /// How often each rule was the first match
    pub triggers: BTreeMap<String, usize>,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulated {} inputs", self.total)?;
        writeln!(f, "  Would allow: {}", self.would_allow)?;
        writeln!(f, "  Would block: {}", self.would_block)?;

        if !self.triggers.is_empty() {
            writeln!(f)?;
            writeln!(f, "Rule triggers:")?;
            let mut counts: Vec<(&String, &usize)> = self.triggers.iter().collect();
            counts.sort_by(|a, b| b.1.cmp(a.1));
            for (rule_id, count) in counts {
                writeln!(f, "  {}: {} times", rule_id, count)?;
            }
        }
        Ok(())
    }
}

/// Simulate each non-empty line as its own request
pub fn simulate_batch<'a, P, I>(
    engine: &RuleEngine<P>,
    lines: I,
    event: TriggerEvent,
    target: &str,
) -> BatchReport
where
    P: PredicateRunner,
    I: IntoIterator<Item = &'a str>,
{
    let mut report = BatchReport::default();

    for line in lines.into_iter().map(str::trim).filter(|l| !l.is_empty()) {
        let simulation = simulate(engine, &ActionRequest::new(event, target, line));

        report.total += 1;
        if simulation.would_block {
            report.would_block += 1;
        } else {
            report.would_allow += 1;
        }
        if let Some(first) = simulation.first_match {
            *report.triggers.entry(first.rule_id).or_insert(0) += 1;
        }
    }

    report
}
