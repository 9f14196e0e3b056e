//! JSONL audit logging for pattern-guard
//!
//! Records every hook decision to a JSONL file for later analysis. Audit
//! failures are reported to the caller and never change a decision.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::engine::Mode;
use crate::host::HostProtocol;
use crate::input::{ActionRequest, HookInput};
use crate::output::Decision;
use crate::rules::{Action, TargetClass, TriggerEvent};

/// Common secret shapes, redacted from input summaries
pub static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // API keys and tokens
        r"(?i)api[_-]?key\s*[=:]\s*['\x22]?[a-zA-Z0-9_]{16,}",
        r"(?i)secret[_-]?key\s*[=:]\s*['\x22]?[a-zA-Z0-9_]{16,}",
        r"(?i)access[_-]?token\s*[=:]\s*['\x22]?[a-zA-Z0-9_]{16,}",
        // AWS
        r"AKIA[0-9A-Z]{16}",
        r"(?i)aws[_-]?secret[_-]?access[_-]?key\s*[=:]\s*['\x22]?[0-9a-zA-Z/+]{20,}",
        // GitHub
        r"gh[pousr]_[A-Za-z0-9_]{36,}",
        r"github_pat_[A-Za-z0-9_]{22,}",
        // Passwords in commands
        r"(?i)(password|passwd|pwd)\s*[=:]\s*['\x22][^'\x22]+['\x22]",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redact secrets in text for logging
pub fn redact_secrets(text: &str) -> String {
    let mut redacted = text.to_string();

    for pattern in SECRET_PATTERNS.iter() {
        redacted = pattern.replace_all(&redacted, "[REDACTED]").into_owned();
    }

    redacted
}

/// Log level for audit entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Allowed,
    Blocked,
    Warn,
    Ask,
    Disabled,
}

/// An audit log entry
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    /// Timestamp of the decision
    pub timestamp: DateTime<Utc>,

    /// Log level (ALLOWED, BLOCKED, WARN, ASK, DISABLED)
    pub level: LogLevel,

    pub host: HostProtocol,

    pub trigger_event: TriggerEvent,

    pub target_class: TargetClass,

    /// Tool named by the host (e.g. "Bash"), if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    /// Rule ID that matched (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    /// Summary of the input, secrets redacted
    pub input_summary: String,

    /// Rule message (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Session ID (if provided)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AuditEntry {
    /// Create a new audit entry from input and decision
    pub fn new(input: &HookInput, decision: &Decision, mode: Mode) -> Self {
        let level = match (mode, decision.action()) {
            (Mode::Disabled, _) => LogLevel::Disabled,
            (_, None) => LogLevel::Allowed,
            (_, Some(Action::Block)) => LogLevel::Blocked,
            (_, Some(Action::Warn)) => LogLevel::Warn,
            (_, Some(Action::Ask)) => LogLevel::Ask,
        };

        Self {
            timestamp: Utc::now(),
            level,
            host: input.protocol,
            trigger_event: input.request.trigger_event,
            target_class: input.request.target_class.clone(),
            tool: input.tool_name.clone(),
            rule_id: decision.rule_id().map(str::to_string),
            input_summary: redacted_summary(&input.request),
            message: decision.message().map(str::to_string),
            session_id: input.session_id.clone(),
        }
    }
}

/// Redact first so truncation cannot split a secret out of its pattern
fn redacted_summary(request: &ActionRequest) -> String {
    ActionRequest {
        candidate_text: redact_secrets(&request.candidate_text),
        ..request.clone()
    }
    .summary()
}

/// Audit logger
#[derive(Default)]
pub struct AuditLogger {
    writer: Option<BufWriter<File>>,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(path: Option<&Path>) -> Self {
        let writer = path.and_then(|p| {
            if let Some(parent) = p.parent() {
                let _ = std::fs::create_dir_all(parent);
            }

            OpenOptions::new()
                .create(true)
                .append(true)
                .open(p)
                .ok()
                .map(BufWriter::new)
        });

        Self { writer }
    }

    /// Log an audit entry
    pub fn log(&mut self, entry: &AuditEntry) -> Result<(), std::io::Error> {
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(entry)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Log a decision
    pub fn log_decision(
        &mut self,
        input: &HookInput,
        decision: &Decision,
        mode: Mode,
    ) -> Result<(), std::io::Error> {
        let entry = AuditEntry::new(input, decision, mode);
        self.log(&entry)
    }
}
