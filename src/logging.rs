// src/logging.rs

//! Logging setup for `corewatch` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `COREWATCH_LOG` environment variable, either a bare level ("debug")
//!    or full directives ("corewatch=debug,notify=warn")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that stdout carries only the notification
//! stream.

use anyhow::{Result, anyhow};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

const LOG_ENV: &str = "COREWATCH_LOG";

/// Initialise the global logging subscriber.
///
/// Fails if a global subscriber has already been installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => level_filter(level_from_log_level(lvl)),
        None => filter_from_env(),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

fn filter_from_env() -> EnvFilter {
    let Ok(raw) = std::env::var(LOG_ENV) else {
        return level_filter(tracing::Level::INFO);
    };
    if let Some(level) = parse_level_str(&raw) {
        return level_filter(level);
    }
    EnvFilter::try_new(raw.trim()).unwrap_or_else(|err| {
        eprintln!("corewatch: ignoring invalid {LOG_ENV}={raw:?}: {err}");
        level_filter(tracing::Level::INFO)
    })
}

fn level_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
