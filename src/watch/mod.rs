// src/watch/mod.rs

//! Directory watching.
//!
//! This module is responsible for:
//! - Preparing the watched `hardware` directory (creating it if missing).
//! - Wiring up a cross-platform filesystem watcher (`notify`), non-recursively.
//! - Reducing backend events to [`RawOp`]s and dropping attribute-only noise.
//!
//! It does **not** know about subscribers or domain events; it only produces
//! an ordered [`RawOpStream`] for the hub to consume.

use std::path::{Path, PathBuf};

pub mod patterns;
pub mod raw;
pub mod watcher;

pub use patterns::IgnoreSet;
pub use raw::RawOp;
pub use watcher::{
    ChangeSource, PathWatcher, RawOpItem, RawOpSender, RawOpStream, WatchOptions, raw_op_channel,
};

/// Name of the directory, under the configured user root, holding manually
/// installed hardware packages.
pub const HARDWARE_DIR_NAME: &str = "hardware";

/// `<user_dir>/hardware`
pub fn hardware_dir(user_dir: &Path) -> PathBuf {
    user_dir.join(HARDWARE_DIR_NAME)
}
