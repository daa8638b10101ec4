// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CoreWatchError, Result};
use crate::watch::IgnoreSet;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CoreWatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let ignore = IgnoreSet::new(&raw.notifications.ignore)?;
        Ok(ConfigFile::new_unchecked(
            raw.directories,
            raw.notifications,
            ignore,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_directories(cfg)?;
    validate_buffers(cfg)?;
    Ok(())
}

fn validate_directories(cfg: &RawConfigFile) -> Result<()> {
    if let Some(user) = &cfg.directories.user {
        if user.as_os_str().is_empty() {
            return Err(CoreWatchError::ConfigError(
                "[directories].user must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_buffers(cfg: &RawConfigFile) -> Result<()> {
    let n = &cfg.notifications;
    for (name, value) in [
        ("queue_capacity", n.queue_capacity),
        ("watch_buffer", n.watch_buffer),
        ("control_buffer", n.control_buffer),
    ] {
        if value == 0 {
            return Err(CoreWatchError::ConfigError(format!(
                "[notifications].{name} must be >= 1 (got 0)"
            )));
        }
    }
    Ok(())
}
