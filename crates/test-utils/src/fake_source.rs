use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use corewatch::hub::{HubOptions, NotificationHub};
use corewatch::refresh::Refresher;
use corewatch::watch::{ChangeSource, RawOp, RawOpSender, RawOpStream, raw_op_channel};

/// A change source driven by the test instead of the filesystem.
///
/// The hub owns the `ManualSource`; the test keeps the `ManualWatcher` to
/// push raw ops and to see whether the hub stopped its source.
#[derive(Debug)]
pub struct ManualSource {
    stops: Arc<AtomicUsize>,
}

impl ChangeSource for ManualSource {
    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct ManualWatcher {
    sender: RawOpSender,
    stops: Arc<AtomicUsize>,
}

impl ManualWatcher {
    pub async fn emit(&self, op: RawOp) {
        self.sender
            .send(op)
            .await
            .expect("hub stopped consuming raw ops");
    }

    /// Emit `n` `Create` ops.
    pub async fn emit_creates(&self, n: usize) {
        for _ in 0..n {
            self.emit(RawOp::Create).await;
        }
    }

    /// End the stream with a backend error.
    pub async fn fail(&self, reason: &str) {
        self.sender.clone().fail(reason).await;
    }

    /// How many times the hub called `stop` on its source.
    pub fn stop_calls(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

pub fn manual_source(capacity: usize) -> (ManualSource, RawOpStream, ManualWatcher) {
    let (sender, stream) = raw_op_channel(capacity);
    let stops = Arc::new(AtomicUsize::new(0));
    (
        ManualSource {
            stops: Arc::clone(&stops),
        },
        stream,
        ManualWatcher { sender, stops },
    )
}

/// Start a hub fed by a [`ManualSource`].
pub fn start_manual_hub(
    refresher: Arc<dyn Refresher>,
    options: HubOptions,
) -> (NotificationHub, ManualWatcher) {
    let (source, stream, watcher) = manual_source(64);
    let hub = NotificationHub::with_source(source, stream, refresher, options);
    (hub, watcher)
}
