use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use corewatch::errors::{CoreWatchError, Result};
use corewatch::refresh::Refresher;
use corewatch::types::InstanceId;

#[derive(Debug, Default)]
struct Inner {
    instances: BTreeSet<InstanceId>,
    delay: Option<Duration>,
    fail: AtomicBool,
    calls: AtomicUsize,
    seen: Mutex<Vec<BTreeSet<InstanceId>>>,
}

/// A fake refresher that:
/// - records every call and the instance set it was given
/// - optionally sleeps, to widen any refresh/broadcast race
/// - optionally fails, to check the broadcast still happens
#[derive(Debug, Clone, Default)]
pub struct RecordingRefresher {
    inner: Arc<Inner>,
}

impl RecordingRefresher {
    pub fn new(instances: impl IntoIterator<Item = u64>) -> Self {
        Self {
            inner: Arc::new(Inner {
                instances: instances.into_iter().map(InstanceId).collect(),
                ..Inner::default()
            }),
        }
    }

    /// Sleep this long inside every refresh.
    pub fn with_delay(instances: impl IntoIterator<Item = u64>, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                instances: instances.into_iter().map(InstanceId).collect(),
                delay: Some(delay),
                ..Inner::default()
            }),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.inner.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<BTreeSet<InstanceId>> {
        self.inner.seen.lock().unwrap().clone()
    }

    pub fn shared(&self) -> Arc<dyn Refresher> {
        Arc::new(self.clone())
    }
}

impl Refresher for RecordingRefresher {
    fn instance_ids(&self) -> BTreeSet<InstanceId> {
        self.inner.instances.clone()
    }

    fn refresh(&self, instances: &BTreeSet<InstanceId>) -> Result<()> {
        if let Some(delay) = self.inner.delay {
            std::thread::sleep(delay);
        }
        self.inner.seen.lock().unwrap().push(instances.clone());
        // Count last, so a non-zero count means the refresh has completed.
        self.inner.calls.fetch_add(1, Ordering::SeqCst);

        if self.inner.fail.load(Ordering::SeqCst) {
            return Err(CoreWatchError::Refresh("index locked".to_string()));
        }
        Ok(())
    }
}
