// src/errors.rs

//! Crate-wide error type and `Result` alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreWatchError {
    /// The watched directory could not be prepared or registered with the OS.
    #[error("cannot watch {path:?}: {reason}")]
    WatchSetup { path: PathBuf, reason: String },

    /// The OS watch failed after a successful setup; the hub is degraded.
    #[error("hardware watcher unavailable: {0}")]
    WatcherUnavailable(String),

    /// The hub has been shut down and no longer accepts subscriptions.
    #[error("notification hub has shut down")]
    HubShutDown,

    /// The notification subsystem never started for this process.
    #[error("notifications disabled: {0}")]
    NotificationsDisabled(String),

    /// Delivering to one client's stream failed.
    #[error("transport write failed: {0}")]
    TransportWrite(String),

    /// The injected package refresh failed.
    #[error("refresh failed: {0}")]
    Refresh(String),

    #[error("watcher output is already streaming")]
    AlreadyStreaming,

    #[error("unknown notification kind: {0}")]
    UnknownEventKind(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreWatchError {
    pub(crate) fn watch_setup(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CoreWatchError::WatchSetup {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CoreWatchError>;
