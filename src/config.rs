//! Configuration loading for pattern-guard
//!
//! Supports TOML configuration with embedded defaults. The configuration says
//! where each host keeps its rule documents, where the audit log goes and how
//! long a predicate may run; the rules themselves live in JSON documents.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::host::HostProtocol;
use crate::rules::store::RuleStore;

/// General configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable audit logging
    pub audit_log: bool,

    /// Path to audit log file
    pub audit_path: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            audit_log: true,
            audit_path: Some("~/.claude/pattern-guard/audit.jsonl".to_string()),
        }
    }
}

/// External predicate settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredicateConfig {
    /// Wall-clock limit for one predicate run, in milliseconds
    pub timeout_ms: u64,
}

impl Default for PredicateConfig {
    fn default() -> Self {
        Self { timeout_ms: 5000 }
    }
}

/// Rule document locations for one host
#[derive(Debug, Clone, Deserialize)]
pub struct HostPaths {
    /// User-wide rules, applied in every project
    pub wide_rules: String,

    /// Project rules, relative to the working directory
    pub narrow_rules: String,
}

impl HostPaths {
    fn claude() -> Self {
        Self {
            wide_rules: "~/.claude/pattern-guard/rules.json".to_string(),
            narrow_rules: ".claude/pattern-guard/rules.json".to_string(),
        }
    }

    fn cursor() -> Self {
        Self {
            wide_rules: "~/.cursor/pattern-guard/rules.json".to_string(),
            narrow_rules: ".cursor/pattern-guard/rules.json".to_string(),
        }
    }
}

/// Per-host sections
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostsConfig {
    pub claude: HostPaths,
    pub cursor: HostPaths,
}

impl Default for HostsConfig {
    fn default() -> Self {
        Self {
            claude: HostPaths::claude(),
            cursor: HostPaths::cursor(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub predicates: PredicateConfig,
    pub hosts: HostsConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load() -> Self {
        let config_paths = [
            // User-specific config
            dirs::home_dir().map(|p| p.join(".claude/pattern-guard/config.toml")),
            // System-wide config
            Some(PathBuf::from("/etc/pattern-guard/config.toml")),
        ];

        for path in config_paths.into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded config");
                    return config;
                }
                Err(err) => warn!(error = %err, "using default config"),
            }
        }

        Config::default()
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Expand ~ in path strings
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get the audit log path (expanded)
    pub fn audit_path(&self) -> Option<PathBuf> {
        self.general.audit_path.as_ref().map(|p| Self::expand_path(p))
    }

    pub fn predicate_timeout(&self) -> Duration {
        Duration::from_millis(self.predicates.timeout_ms)
    }

    pub fn host_paths(&self, protocol: HostProtocol) -> &HostPaths {
        match protocol {
            HostProtocol::Claude => &self.hosts.claude,
            HostProtocol::Cursor => &self.hosts.cursor,
        }
    }

    /// Rule store for a host; explicit paths replace the configured ones
    pub fn rule_store(
        &self,
        protocol: HostProtocol,
        wide: Option<&Path>,
        narrow: Option<&Path>,
    ) -> RuleStore {
        let paths = self.host_paths(protocol);
        RuleStore::new(
            wide.map(Path::to_path_buf)
                .unwrap_or_else(|| Self::expand_path(&paths.wide_rules)),
            narrow
                .map(Path::to_path_buf)
                .unwrap_or_else(|| Self::expand_path(&paths.narrow_rules)),
        )
    }
}

/// Embedded default configuration
pub const DEFAULT_CONFIG_TOML: &str = r#"
[general]
audit_log = true
audit_path = "~/.claude/pattern-guard/audit.jsonl"

[predicates]
timeout_ms = 5000

[hosts.claude]
wide_rules = "~/.claude/pattern-guard/rules.json"
narrow_rules = ".claude/pattern-guard/rules.json"

[hosts.cursor]
wide_rules = "~/.cursor/pattern-guard/rules.json"
narrow_rules = ".cursor/pattern-guard/rules.json"
"#;
