// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::hub::HubOptions;
use crate::watch::{IgnoreSet, WatchOptions, hardware_dir};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [directories]
/// user = "/home/me/Arduino"
///
/// [notifications]
/// queue_capacity = 16
/// watch_buffer = 64
/// control_buffer = 32
/// ignore = ["*.swp"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub directories: DirectoriesSection,

    #[serde(default)]
    pub notifications: NotificationsSection,
}

/// `[directories]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoriesSection {
    /// The user's package root. Packages installed by hand live in its
    /// `hardware` subdirectory, which is what gets watched.
    #[serde(default)]
    pub user: Option<PathBuf>,
}

/// `[notifications]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsSection {
    /// Per-subscription queue bound; older notifications are dropped beyond it.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Raw-op channel size between the watcher and the hub.
    #[serde(default = "default_watch_buffer")]
    pub watch_buffer: usize,

    /// Control channel size for subscribe/unsubscribe requests.
    #[serde(default = "default_control_buffer")]
    pub control_buffer: usize,

    /// File-name globs whose changes are never reported.
    #[serde(default)]
    pub ignore: Vec<String>,
}

fn default_queue_capacity() -> usize {
    16
}

fn default_watch_buffer() -> usize {
    64
}

fn default_control_buffer() -> usize {
    32
}

impl Default for NotificationsSection {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            watch_buffer: default_watch_buffer(),
            control_buffer: default_control_buffer(),
            ignore: Vec::new(),
        }
    }
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    directories: DirectoriesSection,
    notifications: NotificationsSection,
    ignore: IgnoreSet,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        directories: DirectoriesSection,
        notifications: NotificationsSection,
        ignore: IgnoreSet,
    ) -> Self {
        Self {
            directories,
            notifications,
            ignore,
        }
    }

    pub fn user_dir(&self) -> Option<&Path> {
        self.directories.user.as_deref()
    }

    /// `<user>/hardware`, if a user directory is configured.
    pub fn hardware_dir(&self) -> Option<PathBuf> {
        self.user_dir().map(hardware_dir)
    }

    pub fn notifications(&self) -> &NotificationsSection {
        &self.notifications
    }

    pub fn ignore_set(&self) -> &IgnoreSet {
        &self.ignore
    }

    /// Replace the configured user directory (e.g. from `--user-dir`).
    ///
    /// An empty path is ignored.
    pub fn with_user_dir(mut self, user: impl Into<PathBuf>) -> Self {
        let user = user.into();
        if !user.as_os_str().is_empty() {
            self.directories.user = Some(user);
        }
        self
    }

    pub fn hub_options(&self) -> HubOptions {
        HubOptions {
            queue_capacity: self.notifications.queue_capacity,
            control_buffer: self.notifications.control_buffer,
            watch: WatchOptions {
                buffer: self.notifications.watch_buffer,
                ignore: self.ignore.clone(),
            },
        }
    }
}
