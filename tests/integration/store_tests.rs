//! Integration tests for loading and merging rule documents

use std::fs;
use std::path::{Path, PathBuf};

use pattern_guard::error::PredicateError;
use pattern_guard::rules::store::RuleStore;
use pattern_guard::{
    Action, ActionRequest, Config, HostProtocol, PredicateRunner, RuleEngine, Scope, TriggerEvent,
};
use tempfile::TempDir;

const WIDE: &str = r#"{
    "version": "1.0",
    "rules": [
        {
            "id": "no-force-push",
            "description": "Force pushes rewrite shared history",
            "trigger_event": "pre-action",
            "target_class": "Bash",
            "primary_pattern": "git\\s+push.*--force",
            "action": "block",
            "message": "Use --force-with-lease"
        },
        {
            "id": "npm-install",
            "trigger_event": "pre-action",
            "target_class": "Bash",
            "primary_pattern": "npm install",
            "action": "warn",
            "message": "This project uses pnpm"
        }
    ]
}"#;

const NARROW: &str = r#"{
    "version": "1.0",
    "rules": [
        {
            "id": "no-force-push",
            "trigger_event": "pre-action",
            "target_class": "Bash",
            "primary_pattern": "git\\s+push.*--force",
            "action": "warn",
            "message": "Force pushes are fine on this scratch repo"
        }
    ]
}"#;

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

fn never(_: &str, _: &str) -> Result<bool, PredicateError> {
    Ok(false)
}

fn engine(store: &RuleStore) -> RuleEngine<impl PredicateRunner> {
    RuleEngine::new(store.load_effective(), never)
}

fn shell(command: &str) -> ActionRequest {
    ActionRequest::new(TriggerEvent::PreAction, "Bash", command)
}

#[test]
fn test_merge_override() {
    let dir = TempDir::new().unwrap();
    let store = RuleStore::new(
        write(dir.path(), "user/rules.json", WIDE),
        write(dir.path(), "project/rules.json", NARROW),
    );

    let rules = store.load_effective();
    let ids: Vec<&str> = rules.iter().map(|r| r.rule.id.as_str()).collect();
    assert_eq!(ids, vec!["no-force-push", "npm-install"]);

    let overridden = rules.get("no-force-push").unwrap();
    assert_eq!(overridden.scope, Scope::Narrow);
    assert_eq!(overridden.rule.action, Action::Warn);
    assert_eq!(
        overridden.rule.message,
        "Force pushes are fine on this scratch repo"
    );
    assert_eq!(overridden.rule.description, "");

    let decision = engine(&store).evaluate(&shell("git push --force origin main"));
    assert_eq!(decision.action(), Some(Action::Warn));
}

#[test]
fn test_wide_only() {
    let dir = TempDir::new().unwrap();
    let store = RuleStore::new(
        write(dir.path(), "rules.json", WIDE),
        dir.path().join("no-project-rules.json"),
    );

    assert_eq!(store.load_effective().len(), 2);
    assert!(engine(&store).evaluate(&shell("git push -f --force")).is_block());
}

#[test]
fn test_malformed_narrow_leaves_wide_in_force() {
    let dir = TempDir::new().unwrap();
    let store = RuleStore::new(
        write(dir.path(), "user/rules.json", WIDE),
        // a concurrent writer stopped halfway
        write(dir.path(), "project/rules.json", &NARROW[..NARROW.len() / 2]),
    );

    assert!(store.load(Scope::Narrow).is_empty());
    let decision = engine(&store).evaluate(&shell("git push --force"));
    assert!(decision.is_block());
}

#[test]
fn test_unreadable_documents_are_empty() {
    let dir = TempDir::new().unwrap();
    let store = RuleStore::new(
        write(dir.path(), "wide.json", r#"{"version": "1.0", "rules": "none"}"#),
        // a directory cannot be read as a file
        dir.path().to_path_buf(),
    );

    assert!(store.load_effective().is_empty());
}

#[test]
fn test_legacy_document() {
    let dir = TempDir::new().unwrap();
    let legacy = r#"{
        "version": "1.0",
        "patterns": [{
            "id": "pipe-to-head",
            "hook": "PreToolUse",
            "matcher": "Bash",
            "pattern": "\\|\\s*head",
            "exclude_pattern": "",
            "check_script": "",
            "action": "ask"
        }]
    }"#;
    let store = RuleStore::new(
        write(dir.path(), "rules.json", legacy),
        dir.path().join("none.json"),
    );

    let decision = engine(&store).evaluate(&shell("cargo test | head"));
    assert_eq!(decision.rule_id(), Some("pipe-to-head"));
    assert_eq!(decision.action(), Some(Action::Ask));
    assert_eq!(decision.message(), Some("Pattern matched"));
}

#[test]
fn test_legacy_post_action_file_pattern() {
    let dir = TempDir::new().unwrap();
    let legacy = r#"{
        "version": "1.0",
        "patterns": [{
            "id": "py-edit",
            "hook": "PostToolUse",
            "matcher": "Write|Edit",
            "file_pattern": "\\.py$",
            "action": "warn",
            "message": "Run the formatter"
        }]
    }"#;
    let store = RuleStore::new(
        write(dir.path(), "rules.json", legacy),
        dir.path().join("none.json"),
    );

    assert_eq!(store.load_effective().len(), 1);

    let engine = engine(&store);
    let edit = ActionRequest::new(TriggerEvent::PostAction, "Edit", "src/app.py");
    assert_eq!(engine.evaluate(&edit).rule_id(), Some("py-edit"));

    let other = ActionRequest::new(TriggerEvent::PostAction, "Edit", "src/app.rs");
    assert!(!engine.evaluate(&other).is_match());
}

#[test]
fn test_unknown_action_skips_entry() {
    let dir = TempDir::new().unwrap();
    let doc = r#"{"version":"1.0","rules":[
        {"id":"auto-format","trigger_event":"post-action","primary_pattern":".*","action":"run"},
        {"id":"lint","trigger_event":"post-action","primary_pattern":"\\.rs$","action":"warn"}
    ]}"#;
    let store = RuleStore::new(write(dir.path(), "rules.json", doc), dir.path().join("x.json"));

    let rules = store.load_effective();
    assert_eq!(rules.len(), 1);
    assert!(rules.get("auto-format").is_none());
}

#[test]
fn test_config_points_at_rule_documents() {
    let dir = TempDir::new().unwrap();
    let wide = write(dir.path(), "cursor/rules.json", WIDE);
    let config_path = write(
        dir.path(),
        "config.toml",
        &format!(
            "[hosts.cursor]\nwide_rules = {:?}\nnarrow_rules = {:?}\n",
            wide.display().to_string(),
            dir.path().join("missing.json").display().to_string()
        ),
    );

    let config = Config::load_from(&config_path).unwrap();
    let store = config.rule_store(HostProtocol::Cursor, None, None);
    assert_eq!(store.path(Scope::Wide), wide.as_path());
    assert_eq!(store.load_effective().len(), 2);
}
