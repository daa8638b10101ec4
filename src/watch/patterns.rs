// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::{CoreWatchError, Result};

/// Compiled `ignore` globs from `[notifications]`.
///
/// Patterns are matched against the *file name* of an event path, since the
/// watcher only observes a single directory level:
///
/// ```toml
/// [notifications]
/// ignore = ["*.swp", ".#*", "*~"]
/// ```
#[derive(Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<String>,
    set: Option<GlobSet>,
}

impl fmt::Debug for IgnoreSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IgnoreSet")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl IgnoreSet {
    /// Compile the given glob patterns. An empty list ignores nothing.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern).map_err(|e| {
                CoreWatchError::ConfigError(format!("invalid ignore pattern {pattern:?}: {e}"))
            })?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| CoreWatchError::ConfigError(format!("building ignore set: {e}")))?;

        Ok(Self {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            set: Some(set),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_none()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns true if the file name of `path` matches any ignore pattern.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let Some(set) = &self.set else {
            return false;
        };
        match path.file_name() {
            Some(name) => set.is_match(name.to_string_lossy().as_ref()),
            None => false,
        }
    }

    /// An event is skipped only when it names paths and every one is ignored.
    pub fn ignores_all<P: AsRef<Path>>(&self, paths: &[P]) -> bool {
        !self.is_empty()
            && !paths.is_empty()
            && paths.iter().all(|p| self.is_ignored(p.as_ref()))
    }
}
