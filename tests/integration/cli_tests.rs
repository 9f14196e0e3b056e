//! End-to-end tests of the pattern-guard binary

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

const RULES: &str = r#"{
    "version": "1.0",
    "rules": [
        {
            "id": "no-force-push",
            "trigger_event": "pre-action",
            "target_class": "Bash",
            "primary_pattern": "git\\s+push.*--force",
            "action": "block",
            "message": "Use --force-with-lease"
        },
        {
            "id": "confirm-deploy",
            "trigger_event": "pre-action",
            "target_class": "Bash",
            "primary_pattern": "make deploy",
            "action": "ask",
            "message": "Deploys go through CI"
        },
        {
            "id": "tests-first",
            "trigger_event": "prompt-submitted",
            "primary_pattern": "refactor",
            "action": "warn",
            "message": "Run the test suite first"
        }
    ]
}"#;

/// A scratch HOME and project directory with a user-wide rule file
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rules.json"), RULES).unwrap();
        Self { dir }
    }

    fn rules(&self) -> PathBuf {
        self.dir.path().join("rules.json")
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("pattern-guard").unwrap();
        cmd.env("HOME", self.path())
            .env_remove("PATTERN_GUARD_DISABLED")
            .env_remove("PATTERN_GUARD_WARN_ONLY")
            .env_remove("PATTERN_GUARD_LOG")
            .current_dir(self.path())
            .arg("--wide-rules")
            .arg(self.rules());
        cmd
    }

    fn hook(&self, args: &[&str], stdin: &str) -> Value {
        let output = self.command().args(args).write_stdin(stdin).output().unwrap();
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn claude_bash(command: &str) -> String {
    serde_json::json!({
        "session_id": "abc",
        "hook_event_name": "PreToolUse",
        "tool_name": "Bash",
        "tool_input": {"command": command}
    })
    .to_string()
}

// ============================================================================
// Hook mode
// ============================================================================

#[test]
fn test_claude_block() {
    let sandbox = Sandbox::new();
    let out = sandbox.hook(&[], &claude_bash("git push --force origin main"));
    assert_eq!(out["hookSpecificOutput"]["permissionDecision"], "deny");
    assert_eq!(
        out["hookSpecificOutput"]["permissionDecisionReason"],
        "Use --force-with-lease"
    );
}

#[test]
fn test_claude_allow_and_ask() {
    let sandbox = Sandbox::new();

    // no opinion leaves the decision to the user's own permission settings
    let out = sandbox.hook(&["check"], &claude_bash("git status"));
    assert_eq!(out, serde_json::json!({}));

    let out = sandbox.hook(&["check"], &claude_bash("make deploy"));
    assert_eq!(out["hookSpecificOutput"]["permissionDecision"], "ask");
}

#[test]
fn test_cursor_block_and_degraded_ask() {
    let sandbox = Sandbox::new();

    let out = sandbox.hook(&[], r#"{"command":"git push --force"}"#);
    assert_eq!(out["allowed"], false);
    assert_eq!(out["message"], "Use --force-with-lease");

    let out = sandbox.hook(&[], r#"{"command":"make deploy"}"#);
    assert_eq!(out["allowed"], true);
    assert!(out["message"].as_str().unwrap().contains("Deploys go through CI"));
}

#[test]
fn test_host_and_event_flags() {
    let sandbox = Sandbox::new();
    let out = sandbox.hook(
        &["--host", "cursor", "check", "--event", "prompt-submitted"],
        r#"{"prompt":"please refactor this"}"#,
    );
    assert_eq!(out["allowed"], true);
    assert_eq!(out["message"], "Run the test suite first");
}

#[test]
fn test_normalised_input() {
    let sandbox = Sandbox::new();
    let out = sandbox.hook(
        &[],
        r#"{"trigger_event":"pre-action","target_class":"shell-exec",
            "candidate_text":"git push --force","host_protocol":"cursor"}"#,
    );
    assert_eq!(out["allowed"], false);
}

#[test]
fn test_narrow_rules_override() {
    let sandbox = Sandbox::new();
    let narrow = sandbox.path().join("project.json");
    fs::write(
        &narrow,
        r#"{"version":"1.0","rules":[{"id":"no-force-push","trigger_event":"pre-action",
            "primary_pattern":"--force","action":"warn","message":"scratch repo"}]}"#,
    )
    .unwrap();

    let out = sandbox.hook(
        &["--narrow-rules", narrow.to_str().unwrap()],
        &claude_bash("git push --force"),
    );
    assert!(out["hookSpecificOutput"].get("permissionDecision").is_none());
    assert!(out["systemMessage"].as_str().unwrap().contains("scratch repo"));
}

#[test]
fn test_dry_run_downgrades_block() {
    let sandbox = Sandbox::new();
    let out = sandbox.hook(&["--dry-run"], &claude_bash("git push --force"));
    assert!(out["hookSpecificOutput"].get("permissionDecision").is_none());
    assert!(out["hookSpecificOutput"]["additionalContext"]
        .as_str()
        .unwrap()
        .contains("Use --force-with-lease"));
}

#[test]
fn test_disabled_env() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .command()
        .env("PATTERN_GUARD_DISABLED", "1")
        .write_stdin(claude_bash("git push --force"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let out: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(out, serde_json::json!({}));
}

#[test]
fn test_empty_stdin_allows() {
    let sandbox = Sandbox::new();
    let out = sandbox.hook(&[], "");
    assert_eq!(out, serde_json::json!({}));

    let out = sandbox.hook(&["--host", "cursor"], "  \n");
    assert_eq!(out, serde_json::json!({"allowed": true}));
}

#[test]
fn test_malformed_input_exits_nonzero() {
    let sandbox = Sandbox::new();
    let output = sandbox.command().write_stdin("{not json").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_missing_rule_files_allow() {
    let sandbox = Sandbox::new();
    let output = Command::cargo_bin("pattern-guard")
        .unwrap()
        .env("HOME", sandbox.path())
        .current_dir(sandbox.path())
        .write_stdin(claude_bash("git push --force"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let out: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(out, serde_json::json!({}));
}

#[test]
fn test_audit_log_written() {
    let sandbox = Sandbox::new();
    sandbox.hook(&[], &claude_bash("git push --force"));

    let log = sandbox.path().join(".claude/pattern-guard/audit.jsonl");
    let content = fs::read_to_string(log).unwrap();
    let entry: Value = serde_json::from_str(content.lines().last().unwrap()).unwrap();
    assert_eq!(entry["level"], "BLOCKED");
    assert_eq!(entry["rule_id"], "no-force-push");
    assert_eq!(entry["session_id"], "abc");
    assert_eq!(entry["tool"], "Bash");
}

// ============================================================================
// Harness commands
// ============================================================================

#[test]
fn test_rule_command() {
    let sandbox = Sandbox::new();

    let out = sandbox.hook(
        &["test", "no-force-push", "git push --force origin main", "--json"],
        "",
    );
    assert_eq!(out["matched"], true);
    assert_eq!(out["action"], "block");
    assert_eq!(out["scope"], "wide");

    let out = sandbox.hook(&["test", "no-force-push", "git pull", "--json"], "");
    assert_eq!(out["matched"], false);
    assert!(out["reason"].as_str().unwrap().contains("does not match"));

    let out = sandbox.hook(&["test", "no-such-rule", "x", "--json"], "");
    assert!(out["reason"].as_str().unwrap().contains("not found"));
}

#[test]
fn test_rule_command_text() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .command()
        .args(["test", "no-force-push", "git push --force"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("WOULD match"));
    assert!(text.contains("Action: block"));
}

#[test]
fn test_simulate_command() {
    let sandbox = Sandbox::new();
    let out = sandbox.hook(&["simulate", "git push --force", "--target", "Bash", "--json"], "");
    assert_eq!(out["first_match"]["rule_id"], "no-force-push");
    assert_eq!(out["would_block"], true);
}

#[test]
fn test_batch_command() {
    let sandbox = Sandbox::new();
    let batch = sandbox.path().join("commands.txt");
    fs::write(
        &batch,
        "git push --force\nmake deploy\n\ncargo build\ngit push -f --force origin\n",
    )
    .unwrap();

    let out = sandbox.hook(&["batch", batch.to_str().unwrap(), "--json"], "");
    assert_eq!(out["total"], 4);
    assert_eq!(out["would_block"], 2);
    assert_eq!(out["would_allow"], 2);
    assert_eq!(out["triggers"]["no-force-push"], 2);
    assert_eq!(out["triggers"]["confirm-deploy"], 1);
}

#[test]
fn test_batch_missing_file_fails() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .command()
        .args(["batch", "does-not-exist.txt"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}
