//! External predicate runner
//!
//! A predicate is an external check consulted when a regex alone cannot
//! decide, e.g. "is the working copy on a protected branch?".
//!
//! # Exit-code convention
//!
//! Exit status 0 means the condition is **not** met. Any non-zero status
//! means it **is** met. This is the reverse of the usual "success means true"
//! reading; it follows the shell idiom of a check script that fails when it
//! finds something. Existing check scripts depend on it, so it must not be
//! flipped. `PredicateRunner::run` returns `Ok(true)` for "condition met",
//! which keeps the inversion inside `ProcessPredicate`.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use tracing::debug;
use wait_timeout::ChildExt;

use crate::config::Config;
use crate::error::PredicateError;

/// Default upper bound on a predicate's running time
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Answers whether a predicate's condition holds for a candidate text
pub trait PredicateRunner {
    /// `Ok(true)` when the condition is met, `Ok(false)` when it is not
    fn run(&self, predicate_ref: &str, candidate: &str) -> Result<bool, PredicateError>;
}

impl<F> PredicateRunner for F
where
    F: Fn(&str, &str) -> Result<bool, PredicateError>,
{
    fn run(&self, predicate_ref: &str, candidate: &str) -> Result<bool, PredicateError> {
        self(predicate_ref, candidate)
    }
}

/// Runs predicates as subprocesses
///
/// The predicate reference is split into shell words; the candidate text is
/// appended as the final argument.
#[derive(Debug, Clone)]
pub struct ProcessPredicate {
    timeout: Duration,
    search_dirs: Vec<PathBuf>,
}

impl Default for ProcessPredicate {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl ProcessPredicate {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            search_dirs: Vec::new(),
        }
    }

    /// Directories to try for relative script paths not found from the
    /// working directory, in order
    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn resolve(&self, program: &str) -> PathBuf {
        let path = Config::expand_path(program);
        if path.is_absolute() {
            return path;
        }

        let bare = path.components().count() == 1;
        if !bare && path.exists() {
            return path;
        }

        self.search_dirs
            .iter()
            .map(|dir| dir.join(&path))
            .find(|candidate| candidate.is_file())
            // Bare names fall through to a PATH lookup
            .unwrap_or(path)
    }
}

impl PredicateRunner for ProcessPredicate {
    fn run(&self, predicate_ref: &str, candidate: &str) -> Result<bool, PredicateError> {
        let mut words = shlex::split(predicate_ref)
            .ok_or_else(|| PredicateError::Parse(predicate_ref.to_string()))?;
        if words.is_empty() {
            return Err(PredicateError::EmptyCommand);
        }
        let program = words.remove(0);
        let resolved = self.resolve(&program);

        let mut child = Command::new(&resolved)
            .args(&words)
            .arg(candidate)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PredicateError::Spawn {
                program: program.clone(),
                source,
            })?;

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(PredicateError::Timeout {
                    program,
                    timeout: self.timeout,
                });
            }
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(PredicateError::Wait { program, source });
            }
        };

        match status.code() {
            Some(0) => {
                debug!(program = %resolved.display(), "predicate not met");
                Ok(false)
            }
            Some(code) => {
                debug!(program = %resolved.display(), code, "predicate met");
                Ok(true)
            }
            None => Err(PredicateError::Terminated { program }),
        }
    }
}
