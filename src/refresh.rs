// src/refresh.rs

//! Package-index refresh hook.
//!
//! The hub does not know how installed packages are indexed. Whoever
//! composes the daemon hands it a [`Refresher`], which the hub calls before
//! every broadcast so that subscribers only hear about a change once the
//! re-indexed state is in effect.

use std::collections::BTreeSet;
use std::fmt;

use tracing::info;

use crate::errors::{CoreWatchError, Result};
use crate::types::InstanceId;

/// External collaborator that re-indexes installed packages.
///
/// Called from the blocking thread pool; implementations may do IO.
pub trait Refresher: Send + Sync + 'static {
    /// Instances that exist right now.
    fn instance_ids(&self) -> BTreeSet<InstanceId>;

    /// Rescan the given instances.
    fn refresh(&self, instances: &BTreeSet<InstanceId>) -> Result<()>;
}

/// [`Refresher`] built from two closures: one listing instances and one
/// rescanning a single instance.
///
/// Every instance is rescanned even if an earlier one fails; failures are
/// reported together.
pub struct FnRefresher<I, R> {
    instances: I,
    rescan: R,
}

impl<I, R> FnRefresher<I, R>
where
    I: Fn() -> BTreeSet<InstanceId> + Send + Sync + 'static,
    R: Fn(InstanceId) -> anyhow::Result<()> + Send + Sync + 'static,
{
    pub fn new(instances: I, rescan: R) -> Self {
        Self { instances, rescan }
    }
}

impl<I, R> fmt::Debug for FnRefresher<I, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRefresher").finish_non_exhaustive()
    }
}

impl<I, R> Refresher for FnRefresher<I, R>
where
    I: Fn() -> BTreeSet<InstanceId> + Send + Sync + 'static,
    R: Fn(InstanceId) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn instance_ids(&self) -> BTreeSet<InstanceId> {
        (self.instances)()
    }

    fn refresh(&self, instances: &BTreeSet<InstanceId>) -> Result<()> {
        let failures: Vec<String> = instances
            .iter()
            .filter_map(|id| {
                (self.rescan)(*id)
                    .err()
                    .map(|err| format!("{id}: {err:#}"))
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CoreWatchError::Refresh(failures.join("; ")))
        }
    }
}

/// Refresher that only records the request in the log.
///
/// Used by the standalone binary, which has no package index of its own.
#[derive(Debug, Clone, Default)]
pub struct LogOnlyRefresher {
    instances: BTreeSet<InstanceId>,
}

impl LogOnlyRefresher {
    pub fn new(instances: impl IntoIterator<Item = InstanceId>) -> Self {
        Self {
            instances: instances.into_iter().collect(),
        }
    }
}

impl Refresher for LogOnlyRefresher {
    fn instance_ids(&self) -> BTreeSet<InstanceId> {
        self.instances.clone()
    }

    fn refresh(&self, instances: &BTreeSet<InstanceId>) -> Result<()> {
        for id in instances {
            info!(instance = %id, "rescan requested");
        }
        Ok(())
    }
}
