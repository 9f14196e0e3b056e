//! pattern-guard - Rule-based interception for coding-agent hooks
//!
//! This library evaluates an agent's pending action (a shell command, a file
//! write, a submitted prompt) against user-authored rules and answers in the
//! hook protocol of the host that asked.
//!
//! # Features
//!
//! - **Two rule scopes**: user-wide and per-project rules, project rules
//!   shadowing user rules with the same id
//! - **Regex conditions**: a primary pattern, optionally suppressed by an
//!   exclude pattern
//! - **External predicates**: rules can consult a program for conditions a
//!   regex cannot express (current branch, repository state)
//! - **Two hosts**: Claude Code (allow / deny / ask) and Cursor (allowed flag)
//! - **Test harness**: check one rule or simulate the whole set offline
//! - **Audit logging**: JSONL log of all decisions
//!
//! # Example
//!
//! ```
//! use pattern_guard::rules::merge::merge;
//! use pattern_guard::rules::store::{parse_collection, RuleCollection};
//! use pattern_guard::rules::Scope;
//! use pattern_guard::{host, HookInput, ProcessPredicate, RuleEngine};
//!
//! let doc = r#"{"version": "1.0", "rules": [{
//!     "id": "no-force-push",
//!     "trigger_event": "pre-action",
//!     "target_class": "Bash",
//!     "primary_pattern": "git\\s+push.*--force",
//!     "action": "block",
//!     "message": "Use --force-with-lease instead"
//! }]}"#;
//! let wide = parse_collection(doc, Scope::Wide, None).unwrap();
//! let rules = merge(wide, RuleCollection::empty(Scope::Narrow));
//! let engine = RuleEngine::new(rules, ProcessPredicate::default());
//!
//! let input = r#"{"hook_event_name":"PreToolUse","tool_name":"Bash","tool_input":{"command":"git push --force"}}"#;
//! let hook_input = HookInput::from_json(input).unwrap();
//!
//! let decision = engine.check(&hook_input.request);
//! assert!(decision.is_block());
//!
//! let response = host::render(&decision, hook_input.protocol, hook_input.request.trigger_event);
//! assert!(!response.allows());
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod harness;
pub mod host;
pub mod input;
pub mod logging;
pub mod output;
pub mod rules;

// Re-exports for convenience
pub use config::Config;
pub use engine::predicate::{PredicateRunner, ProcessPredicate};
pub use engine::{Mode, RuleEngine};
pub use host::{HookResponse, HostAdapter, HostProtocol};
pub use input::{ActionRequest, HookInput};
pub use output::Decision;
pub use rules::{Action, Rule, Scope, TriggerEvent};
