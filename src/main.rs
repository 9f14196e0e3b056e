//! pattern-guard - Rule-based interception for coding-agent hooks
//!
//! # Usage
//!
//! ```bash
//! # As a hook (reads JSON from stdin, writes JSON to stdout)
//! echo '{"hook_event_name":"PreToolUse","tool_name":"Bash","tool_input":{"command":"git push --force"}}' | pattern-guard
//!
//! # Registered as a Cursor beforeShellExecution hook
//! pattern-guard --host cursor check --event pre-action
//!
//! # Try a rule without a host
//! pattern-guard test no-force-push "git push --force origin main"
//! pattern-guard simulate "git push origin main"
//! pattern-guard batch commands.txt --json
//! ```

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, warn};

use pattern_guard::{
    audit::AuditLogger,
    config::Config,
    engine::{predicate::ProcessPredicate, Mode, RuleEngine},
    harness, host,
    input::{ActionRequest, HookInput, InputHints},
    logging,
    output::Decision,
    rules::{store::RuleStore, TriggerEvent},
    HostProtocol,
};

#[derive(Parser, Debug)]
#[command(name = "pattern-guard")]
#[command(version)]
#[command(about = "Rule-based interception of coding-agent actions")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Host protocol to answer in: claude or cursor (detected if omitted)
    #[arg(long, global = true)]
    host: Option<HostProtocol>,

    /// User-wide rule document, replacing the configured path
    #[arg(long, global = true)]
    wide_rules: Option<PathBuf>,

    /// Project rule document, replacing the configured path
    #[arg(long, global = true)]
    narrow_rules: Option<PathBuf>,

    /// Show what would be blocked, but only warn
    #[arg(short, long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one hook request read from stdin (the default)
    Check {
        /// Trigger event, overriding the one in the request
        #[arg(long)]
        event: Option<TriggerEvent>,
    },

    /// Test whether a single rule would match an input
    Test {
        rule_id: String,

        input: String,

        /// Target class or tool name (e.g. Bash, Write)
        #[arg(long)]
        target: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Simulate the whole rule set against one input
    Simulate {
        input: String,

        #[arg(long, default_value = "pre-action")]
        event: TriggerEvent,

        #[arg(long, default_value = "shell-exec")]
        target: String,

        #[arg(long)]
        json: bool,
    },

    /// Simulate every non-empty line of a file
    Batch {
        file: PathBuf,

        #[arg(long, default_value = "pre-action")]
        event: TriggerEvent,

        #[arg(long, default_value = "shell-exec")]
        target: String,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    logging::init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = format!("{:#}", err);
            error!(error = %message, "hook failed");
            eprintln!("pattern-guard: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref());

    match &cli.command {
        None => check(&cli, &config, None),
        Some(Command::Check { event }) => check(&cli, &config, *event),
        Some(Command::Test {
            rule_id,
            input,
            target,
            json,
        }) => {
            let store = rule_store(&cli, &config, cli.host.unwrap_or(HostProtocol::Claude));
            let predicates = predicate_runner(&config, &store);
            let report = harness::test_rule(
                &store.load_effective(),
                rule_id,
                input,
                target.as_deref(),
                &predicates,
            );
            print_report(&report, *json)
        }
        Some(Command::Simulate {
            input,
            event,
            target,
            json,
        }) => {
            let engine = build_engine(&cli, &config, cli.host.unwrap_or(HostProtocol::Claude));
            let request = ActionRequest::new(*event, target, input.as_str());
            let report = harness::simulate(&engine, &request);
            print_report(&report, *json)
        }
        Some(Command::Batch {
            file,
            event,
            target,
            json,
        }) => {
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let engine = build_engine(&cli, &config, cli.host.unwrap_or(HostProtocol::Claude));
            let report = harness::simulate_batch(&engine, text.lines(), *event, target);
            print_report(&report, *json)
        }
    }
}

fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(path) => Config::load_from(path).unwrap_or_else(|err| {
            warn!(error = %err, "using default config");
            Config::default()
        }),
        None => Config::load(),
    }
}

fn rule_store(cli: &Cli, config: &Config, protocol: HostProtocol) -> RuleStore {
    config.rule_store(
        protocol,
        cli.wide_rules.as_deref(),
        cli.narrow_rules.as_deref(),
    )
}

fn predicate_runner(config: &Config, store: &RuleStore) -> ProcessPredicate {
    ProcessPredicate::new(config.predicate_timeout()).with_search_dirs(store.rule_dirs())
}

fn build_engine(cli: &Cli, config: &Config, protocol: HostProtocol) -> RuleEngine {
    let store = rule_store(cli, config, protocol);
    let predicates = predicate_runner(config, &store);
    RuleEngine::new(store.load_effective(), predicates)
}

/// Handle one hook invocation
fn check(cli: &Cli, config: &Config, event: Option<TriggerEvent>) -> Result<()> {
    let mut input_json = String::new();
    io::stdin()
        .read_to_string(&mut input_json)
        .context("failed to read hook input")?;

    let hints = InputHints {
        protocol: cli.host,
        event,
    };

    // No input = nothing to check, allow
    if input_json.trim().is_empty() {
        let response = host::render(
            &Decision::NoMatch,
            hints.protocol.unwrap_or(HostProtocol::Claude),
            hints.event.unwrap_or(TriggerEvent::PreAction),
        );
        return emit(&response.to_json());
    }

    let input =
        HookInput::from_json_with(&input_json, hints).context("failed to parse hook input")?;

    let mode = match Mode::from_env() {
        Mode::Enforce if cli.dry_run => Mode::WarnOnly,
        mode => mode,
    };
    let engine = build_engine(cli, config, input.protocol).with_mode(mode);
    let decision = engine.check(&input.request);

    let audit_path = if config.general.audit_log {
        config.audit_path()
    } else {
        None
    };
    let mut logger = AuditLogger::new(audit_path.as_deref());
    if let Err(err) = logger.log_decision(&input, &decision, mode) {
        warn!(error = %err, "failed to write audit log");
    }

    let response = host::render(&decision, input.protocol, input.request.trigger_event);
    emit(&response.to_json())
}

fn print_report<T: Serialize + std::fmt::Display>(report: &T, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report).context("failed to encode report")?;
        emit(&text)
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{}", report).context("failed to write report")?;
        handle.flush().context("failed to write report")?;
        Ok(())
    }
}

fn emit(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", text).context("failed to write response")?;
    handle.flush().context("failed to write response")?;
    Ok(())
}
