#![allow(dead_code)]

use std::path::Path;

use corewatch::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn user_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.directories.user = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.notifications.queue_capacity = capacity;
        self
    }

    pub fn watch_buffer(mut self, size: usize) -> Self {
        self.config.notifications.watch_buffer = size;
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.config.notifications.ignore.push(pattern.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
