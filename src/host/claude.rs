//! Claude Code hook responses
//!
//! Pre-action hooks answer `deny` or `ask` through `permissionDecision`.
//! An explicit `allow` would skip the user's own permission prompt, so
//! letting an action through is an empty object (plus context for warnings).
//! Post-action and prompt hooks block with `decision: "block"` and inject
//! text into the model's context through `additionalContext`.

use serde::Serialize;

use crate::host::{blocked_notice, warning_notice, HookResponse, HostAdapter, HostProtocol};
use crate::output::Decision;
use crate::rules::{Action, TriggerEvent};

/// Permission decision for a pending tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    Deny,
    Ask,
}

/// Main output structure for Claude Code hooks
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ClaudeResponse {
    /// `"block"` for post-action and prompt hooks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,

    /// Explanation accompanying `decision`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(rename = "hookSpecificOutput", skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,

    /// Optional system message to show the user
    #[serde(rename = "systemMessage", skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

/// Event-specific part of the response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookSpecificOutput {
    #[serde(rename = "hookEventName")]
    pub hook_event_name: String,

    #[serde(rename = "permissionDecision", skip_serializing_if = "Option::is_none")]
    pub permission_decision: Option<PermissionDecision>,

    #[serde(
        rename = "permissionDecisionReason",
        skip_serializing_if = "Option::is_none"
    )]
    pub permission_decision_reason: Option<String>,

    /// Text added to the model's context
    #[serde(rename = "additionalContext", skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

fn event_name(event: TriggerEvent) -> &'static str {
    match event {
        TriggerEvent::PreAction => "PreToolUse",
        TriggerEvent::PostAction => "PostToolUse",
        TriggerEvent::PromptSubmitted => "UserPromptSubmit",
    }
}

impl HookSpecificOutput {
    fn new(event: TriggerEvent) -> Self {
        Self {
            hook_event_name: event_name(event).to_string(),
            permission_decision: None,
            permission_decision_reason: None,
            additional_context: None,
        }
    }
}

impl ClaudeResponse {
    /// Pre-action permission response
    pub fn permission(decision: PermissionDecision, reason: Option<String>) -> Self {
        let mut output = HookSpecificOutput::new(TriggerEvent::PreAction);
        output.permission_decision = Some(decision);
        output.permission_decision_reason = reason;
        Self {
            hook_specific_output: Some(output),
            ..Self::default()
        }
    }

    /// Post-action or prompt block
    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            decision: Some("block".to_string()),
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Inject text into the model's context without blocking
    pub fn context(event: TriggerEvent, text: impl Into<String>) -> Self {
        let mut output = HookSpecificOutput::new(event);
        output.additional_context = Some(text.into());
        Self {
            hook_specific_output: Some(output),
            ..Self::default()
        }
    }

    pub fn with_system_message(mut self, message: String) -> Self {
        self.system_message = Some(message);
        self
    }

    pub fn permission_decision(&self) -> Option<PermissionDecision> {
        self.hook_specific_output
            .as_ref()
            .and_then(|output| output.permission_decision)
    }

    pub fn additional_context(&self) -> Option<&str> {
        self.hook_specific_output
            .as_ref()
            .and_then(|output| output.additional_context.as_deref())
    }

    /// Whether the host will refuse the action
    pub fn is_blocking(&self) -> bool {
        self.decision.as_deref() == Some("block")
            || self.permission_decision() == Some(PermissionDecision::Deny)
    }
}

/// Adapter for Claude Code hooks
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaudeAdapter;

impl HostAdapter for ClaudeAdapter {
    fn protocol(&self) -> HostProtocol {
        HostProtocol::Claude
    }

    fn render(&self, decision: &Decision, event: TriggerEvent) -> HookResponse {
        let response = match decision {
            Decision::NoMatch => ClaudeResponse::default(),
            Decision::Matched {
                rule_id,
                action,
                message,
            } => render_match(event, rule_id, *action, message),
        };
        HookResponse::Claude(response)
    }
}

fn render_match(event: TriggerEvent, rule_id: &str, action: Action, message: &str) -> ClaudeResponse {
    match (event, action) {
        (TriggerEvent::PreAction, Action::Block) => {
            ClaudeResponse::permission(PermissionDecision::Deny, Some(message.to_string()))
                .with_system_message(blocked_notice(rule_id, message))
        }
        (TriggerEvent::PreAction, Action::Ask) => {
            ClaudeResponse::permission(PermissionDecision::Ask, Some(message.to_string()))
        }
        (_, Action::Block) => ClaudeResponse::block(message),
        // Guidance ahead of the model's own reasoning, not a user notice
        (TriggerEvent::PromptSubmitted, _) => ClaudeResponse::context(event, message),
        // Pre-action warn, and post-action warn or ask (ask has no meaning
        // once the tool has run)
        (TriggerEvent::PreAction, _) | (TriggerEvent::PostAction, _) => {
            ClaudeResponse::context(event, warning_notice(rule_id, message))
                .with_system_message(warning_notice(rule_id, message))
        }
    }
}
