//! Engine decisions
//!
//! A `Decision` is host-independent; `crate::host` renders it into the
//! payload a particular host runtime expects.

use crate::rules::{Action, Rule};

/// Outcome of evaluating one action request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// No rule fired
    NoMatch,

    /// A rule fired
    Matched {
        rule_id: String,
        action: Action,
        message: String,
    },
}

impl Decision {
    /// Create a matched decision from the rule that fired
    pub fn matched(rule: &Rule) -> Self {
        Decision::Matched {
            rule_id: rule.id.clone(),
            action: rule.action,
            message: rule.message.clone(),
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Decision::Matched { .. })
    }

    /// Check if this decision blocks the action
    pub fn is_block(&self) -> bool {
        self.action() == Some(Action::Block)
    }

    pub fn action(&self) -> Option<Action> {
        match self {
            Decision::NoMatch => None,
            Decision::Matched { action, .. } => Some(*action),
        }
    }

    /// Get the rule ID if applicable
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            Decision::NoMatch => None,
            Decision::Matched { rule_id, .. } => Some(rule_id),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Decision::NoMatch => None,
            Decision::Matched { message, .. } => Some(message),
        }
    }

    /// Turn a `block` into a `warn`, leaving everything else as is
    pub fn downgrade_block(self) -> Self {
        match self {
            Decision::Matched {
                rule_id,
                action: Action::Block,
                message,
            } => Decision::Matched {
                rule_id,
                action: Action::Warn,
                message,
            },
            other => other,
        }
    }
}
