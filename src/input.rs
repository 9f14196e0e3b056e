//! Input parsing for hook requests
//!
//! Accepts the normalised request form
//! (`trigger_event`, `target_class`, `candidate_text`, `host_protocol`) as
//! well as the native JSON that Claude Code and Cursor send to their hooks.

use serde_json::{Map, Value};

use crate::error::InputError;
use crate::host::HostProtocol;
use crate::rules::{TargetClass, TriggerEvent};

/// One intercepted operation submitted for evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub trigger_event: TriggerEvent,

    pub target_class: TargetClass,

    /// Command string, file path, file content or prompt text to inspect
    pub candidate_text: String,
}

impl ActionRequest {
    pub fn new(trigger_event: TriggerEvent, target: &str, candidate: impl Into<String>) -> Self {
        Self {
            trigger_event,
            target_class: TargetClass::new(target),
            candidate_text: candidate.into(),
        }
    }

    /// Get a summary of the request for logging
    pub fn summary(&self) -> String {
        let truncated = if self.candidate_text.chars().count() > 100 {
            let head: String = self.candidate_text.chars().take(100).collect();
            format!("{}...", head)
        } else {
            self.candidate_text.clone()
        };
        format!("{}: {}", self.target_class, truncated)
    }
}

/// Values supplied out of band (command-line flags) that take precedence
/// over what the payload says
#[derive(Debug, Clone, Copy, Default)]
pub struct InputHints {
    pub protocol: Option<HostProtocol>,
    pub event: Option<TriggerEvent>,
}

/// A parsed hook invocation
#[derive(Debug, Clone)]
pub struct HookInput {
    pub protocol: HostProtocol,

    pub request: ActionRequest,

    /// Optional session identifier
    pub session_id: Option<String>,

    /// Tool named by the host (e.g. "Bash"), if any
    pub tool_name: Option<String>,
}

impl HookInput {
    /// Parse input from JSON string
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        Self::from_json_with(json, InputHints::default())
    }

    /// Parse input, letting `hints` override detected values
    pub fn from_json_with(json: &str, hints: InputHints) -> Result<Self, InputError> {
        let value: Value = serde_json::from_str(json)?;
        let obj = value.as_object().ok_or(InputError::NotAnObject)?;

        let event_name = str_field(obj, &["trigger_event", "hook_event_name"]);

        let trigger_event = match (hints.event, event_name) {
            (Some(event), _) => event,
            (None, Some(name)) => name
                .parse()
                .map_err(|_| InputError::UnknownEvent(name.to_string()))?,
            (None, None) => infer_event(obj).ok_or(InputError::MissingEvent)?,
        };

        let protocol = match (hints.protocol, str_field(obj, &["host_protocol", "protocol"])) {
            (Some(protocol), _) => protocol,
            (None, Some(name)) => name.parse()?,
            (None, None) => detect_protocol(obj, event_name),
        };

        let tool_name = str_field(obj, &["tool_name"]).map(str::to_string);

        let target_class = match str_field(obj, &["target_class"]).or(tool_name.as_deref()) {
            Some(name) => TargetClass::new(name),
            None => default_target(trigger_event, obj),
        };

        Ok(HookInput {
            protocol,
            request: ActionRequest {
                trigger_event,
                target_class,
                candidate_text: candidate_text(obj),
            },
            session_id: str_field(obj, &["session_id", "conversation_id"]).map(str::to_string),
            tool_name,
        })
    }
}

fn str_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| obj.get(*key).and_then(Value::as_str))
}

/// Guess the phase from the payload shape when no event name is given
fn infer_event(obj: &Map<String, Value>) -> Option<TriggerEvent> {
    if obj.contains_key("prompt") {
        Some(TriggerEvent::PromptSubmitted)
    } else if ["output", "tool_output", "tool_response"]
        .iter()
        .any(|key| obj.contains_key(*key))
    {
        Some(TriggerEvent::PostAction)
    } else if obj.contains_key("command") || obj.contains_key("tool_name") {
        Some(TriggerEvent::PreAction)
    } else {
        None
    }
}

fn detect_protocol(obj: &Map<String, Value>, event_name: Option<&str>) -> HostProtocol {
    if let Some(protocol) = event_name.and_then(HostProtocol::for_event) {
        return protocol;
    }

    if obj.contains_key("cursor_version") || obj.contains_key("conversation_id") {
        HostProtocol::Cursor
    } else if obj.contains_key("tool_name") || obj.contains_key("tool_input") {
        HostProtocol::Claude
    } else if obj.contains_key("command") || obj.contains_key("prompt") {
        // Cursor sends bare {"command": ...} / {"prompt": ...} objects
        HostProtocol::Cursor
    } else {
        HostProtocol::Claude
    }
}

fn default_target(event: TriggerEvent, obj: &Map<String, Value>) -> TargetClass {
    match event {
        TriggerEvent::PromptSubmitted => TargetClass::new("prompt"),
        _ if obj.contains_key("command") => TargetClass::new("shell-exec"),
        _ if obj.contains_key("file_path") => TargetClass::new("file-edit"),
        _ => TargetClass::any(),
    }
}

/// Pick the text to inspect: command, then file path, then content, then
/// prompt
fn candidate_text(obj: &Map<String, Value>) -> String {
    if let Some(text) = str_field(obj, &["candidate_text"]) {
        return text.to_string();
    }

    let from_tool = obj
        .get("tool_input")
        .and_then(Value::as_object)
        .and_then(|tool| str_field(tool, &["command", "file_path", "content", "path"]));

    from_tool
        .or_else(|| str_field(obj, &["command", "file_path", "prompt"]))
        .unwrap_or_default()
        .to_string()
}
