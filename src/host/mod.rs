//! Host adapters
//!
//! Each host runtime expects its own hook response shape. An adapter renders
//! the engine's host-independent `Decision` into that shape; the engine never
//! branches on the host.

pub mod claude;
pub mod cursor;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::InputError;
use crate::output::Decision;
use crate::rules::TriggerEvent;

pub use claude::{ClaudeAdapter, ClaudeResponse, PermissionDecision};
pub use cursor::{CursorAdapter, CursorResponse};

/// Wire contract of the runtime that invoked the hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostProtocol {
    /// Permission decisions (deny / ask) with context injection
    Claude,

    /// Two-valued `allowed` flag with an optional message
    Cursor,
}

impl HostProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostProtocol::Claude => "claude",
            HostProtocol::Cursor => "cursor",
        }
    }

    /// Identify the host from a native hook event name
    pub fn for_event(name: &str) -> Option<Self> {
        match name {
            "PreToolUse" | "PostToolUse" | "UserPromptSubmit" => Some(HostProtocol::Claude),
            "beforeShellExecution" | "afterShellExecution" | "afterFileEdit"
            | "beforeSubmitPrompt" => Some(HostProtocol::Cursor),
            _ => None,
        }
    }

    pub fn adapter(&self) -> &'static dyn HostAdapter {
        match self {
            HostProtocol::Claude => &ClaudeAdapter,
            HostProtocol::Cursor => &CursorAdapter,
        }
    }
}

impl FromStr for HostProtocol {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "claude-code" => Ok(HostProtocol::Claude),
            "cursor" => Ok(HostProtocol::Cursor),
            _ => Err(InputError::UnknownProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for HostProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders decisions for one host protocol
pub trait HostAdapter {
    fn protocol(&self) -> HostProtocol;

    /// Render a decision made for a request of the given phase
    fn render(&self, decision: &Decision, event: TriggerEvent) -> HookResponse;
}

/// A rendered response, ready to be written to stdout
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HookResponse {
    Claude(ClaudeResponse),
    Cursor(CursorResponse),
}

impl HookResponse {
    /// Whether the host will let the action proceed
    pub fn allows(&self) -> bool {
        match self {
            HookResponse::Claude(response) => !response.is_blocking(),
            HookResponse::Cursor(response) => response.allowed,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Render a decision in the given host's protocol
pub fn render(decision: &Decision, protocol: HostProtocol, event: TriggerEvent) -> HookResponse {
    protocol.adapter().render(decision, event)
}

fn label(rule_id: &str) -> String {
    format!("[pattern-guard:{}]", rule_id)
}

pub(crate) fn blocked_notice(rule_id: &str, message: &str) -> String {
    format!("{} Blocked: {}", label(rule_id), message)
}

pub(crate) fn warning_notice(rule_id: &str, message: &str) -> String {
    format!("{} Warning: {}", label(rule_id), message)
}
