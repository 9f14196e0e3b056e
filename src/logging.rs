//! Diagnostic logging
//!
//! stdout carries the hook response, so diagnostics go to the file named by
//! `PATTERN_GUARD_LOG` or, failing that, to stderr. `PATTERN_GUARD_LOG_LEVEL`
//! takes `EnvFilter` directives and defaults to `warn`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const LOG_ENV: &str = "PATTERN_GUARD_LOG";
pub const LOG_LEVEL_ENV: &str = "PATTERN_GUARD_LOG_LEVEL";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

pub fn init_tracing() {
    let log_file = std::env::var(LOG_ENV).ok().and_then(|log_path| {
        if let Some(parent) = Path::new(&log_path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .ok()
    });

    let layer: Box<dyn Layer<_> + Send + Sync> = match log_file {
        Some(file) => tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_filter(env_filter())
            .boxed(),
        None => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(false)
            .with_filter(env_filter())
            .boxed(),
    };

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::registry().with(layer).try_init();
}
