// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `corewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "corewatch",
    version,
    about = "Watch the hardware packages folder and stream change notifications.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). Defaults to `corewatch.toml`.
    ///
    /// A missing file is not an error; defaults are used instead.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// User directory whose `hardware` folder is watched.
    ///
    /// Overrides `[directories].user` from the config file.
    #[arg(long, value_name = "PATH")]
    pub user_dir: Option<String>,

    /// Only stream these notification kinds (e.g. `core_changed`).
    ///
    /// May be repeated. If omitted, every kind is streamed.
    #[arg(long = "filter", value_name = "KIND")]
    pub filters: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `COREWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print settings, but don't start watching.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
