//! Scope merger
//!
//! Combines the wide and narrow collections into the single ordered list the
//! engine walks. Narrow rules come first and shadow wide rules by id.

use std::collections::HashSet;

use tracing::debug;

use crate::rules::store::RuleCollection;
use crate::rules::{Rule, Scope};

/// A rule tagged with the scope it was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedRule {
    pub scope: Scope,
    pub rule: Rule,
}

/// The merged, ordered rule list used for one evaluation. Ids are unique.
#[derive(Debug, Clone, Default)]
pub struct EffectiveRuleSet {
    rules: Vec<ScopedRule>,
}

impl EffectiveRuleSet {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScopedRule> {
        self.rules.iter()
    }

    /// Look up a rule by id
    pub fn get(&self, id: &str) -> Option<&ScopedRule> {
        self.rules.iter().find(|r| r.rule.id == id)
    }
}

impl IntoIterator for EffectiveRuleSet {
    type Item = ScopedRule;
    type IntoIter = std::vec::IntoIter<ScopedRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}

/// Merge two collections: every narrow rule in order, then every wide rule
/// whose id the narrow collection does not already use.
///
/// An id repeated inside one collection keeps only its first occurrence, so
/// the result never holds two rules with the same id.
pub fn merge(wide: RuleCollection, narrow: RuleCollection) -> EffectiveRuleSet {
    let mut seen = HashSet::with_capacity(wide.len() + narrow.len());
    let mut rules = Vec::with_capacity(wide.len() + narrow.len());

    let tagged = narrow
        .rules
        .into_iter()
        .map(|rule| (Scope::Narrow, rule))
        .chain(wide.rules.into_iter().map(|rule| (Scope::Wide, rule)));

    for (scope, rule) in tagged {
        if seen.insert(rule.id.clone()) {
            rules.push(ScopedRule { scope, rule });
        } else if rules
            .iter()
            .any(|kept| kept.scope == Scope::Narrow && kept.rule.id == rule.id)
        {
            debug!(
                rule_id = %rule.id,
                wide = ?wide.source,
                narrow = ?narrow.source,
                "narrow rule overrides wide rule"
            );
        }
    }

    EffectiveRuleSet { rules }
}
