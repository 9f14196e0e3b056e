//! Cursor hook responses
//!
//! Cursor hooks answer with a single `allowed` flag and an optional message.
//! There is no confirmation step, so `ask` degrades to a warning that lets
//! the action through.

use serde::Serialize;

use crate::host::{warning_notice, HookResponse, HostAdapter, HostProtocol};
use crate::output::Decision;
use crate::rules::{Action, TriggerEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CursorResponse {
    pub allowed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CursorResponse {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            message: None,
        }
    }
}

/// Adapter for Cursor hooks
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorAdapter;

impl HostAdapter for CursorAdapter {
    fn protocol(&self) -> HostProtocol {
        HostProtocol::Cursor
    }

    fn render(&self, decision: &Decision, event: TriggerEvent) -> HookResponse {
        let response = match decision {
            Decision::NoMatch => CursorResponse::allow(),
            Decision::Matched {
                action: Action::Block,
                message,
                ..
            } => CursorResponse {
                allowed: false,
                message: Some(message.clone()),
            },
            // Warn and Ask alike: no way to pause for confirmation here.
            // Prompt guidance can only surface as a user-facing notice.
            Decision::Matched { message, .. } if event == TriggerEvent::PromptSubmitted => {
                CursorResponse {
                    allowed: true,
                    message: Some(message.clone()),
                }
            }
            Decision::Matched {
                rule_id, message, ..
            } => CursorResponse {
                allowed: true,
                message: Some(warning_notice(rule_id, message)),
            },
        };
        HookResponse::Cursor(response)
    }
}
