use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use corewatch::errors::CoreWatchError;
use corewatch::session::{Transport, TransportFuture};
use corewatch::types::Notification;

/// A fake transport that records what was sent and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<Notification>>>,
    fail_after: Option<usize>,
    closed: Arc<AtomicBool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `n` notifications, then fail every write.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sequences(&self) -> Vec<u64> {
        self.sent().iter().map(|n| n.sequence).collect()
    }

    /// Whether the stream was closed normally.
    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, notification: Notification) -> TransportFuture<'_> {
        let sent = Arc::clone(&self.sent);
        let fail_after = self.fail_after;

        Box::pin(async move {
            let mut guard = sent.lock().unwrap();
            if fail_after.is_some_and(|n| guard.len() >= n) {
                return Err(CoreWatchError::TransportWrite("broken pipe".to_string()));
            }
            guard.push(notification);
            Ok(())
        })
    }

    fn close(&mut self) -> TransportFuture<'_> {
        let closed = Arc::clone(&self.closed);
        Box::pin(async move {
            closed.store(true, Ordering::SeqCst);
            Ok(())
        })
    }
}
