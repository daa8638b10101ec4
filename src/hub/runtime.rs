// src/hub/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::errors::CoreWatchError;
use crate::refresh::Refresher;
use crate::watch::{ChangeSource, RawOp, RawOpStream};

use super::core::HubCore;
use super::{HubCommand, HubStatus};

/// Drives the hub: the only task that touches the registry or the watcher.
///
/// Waits on two inputs, the control channel and the raw-op stream. Control
/// messages are polled first so a subscription acknowledged to its caller is
/// in the registry before any later raw op is handled.
pub struct HubRuntime {
    core: HubCore,
    source: Box<dyn ChangeSource>,
    ops: RawOpStream,
    control_rx: mpsc::Receiver<HubCommand>,
    refresher: Arc<dyn Refresher>,
    status_tx: watch::Sender<HubStatus>,
}

impl fmt::Debug for HubRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubRuntime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

/// Why the main loop stopped.
enum Exit {
    Shutdown(Option<oneshot::Sender<()>>),
    Degraded(String),
}

impl HubRuntime {
    pub(crate) fn new(
        core: HubCore,
        source: Box<dyn ChangeSource>,
        ops: RawOpStream,
        control_rx: mpsc::Receiver<HubCommand>,
        refresher: Arc<dyn Refresher>,
        status_tx: watch::Sender<HubStatus>,
    ) -> Self {
        Self {
            core,
            source,
            ops,
            control_rx,
            refresher,
            status_tx,
        }
    }

    /// Main loop. Returns once the hub has shut down or degraded.
    pub async fn run(mut self) {
        info!("notification hub started");

        let exit = loop {
            tokio::select! {
                biased;

                command = self.control_rx.recv() => match command {
                    Some(command) => {
                        if let Some(exit) = self.handle_command(command) {
                            break exit;
                        }
                    }
                    None => {
                        info!("all hub handles dropped; shutting down");
                        break Exit::Shutdown(None);
                    }
                },

                item = self.ops.next() => match item {
                    Some(Ok(op)) => self.handle_raw_op(op).await,
                    Some(Err(err)) => {
                        warn!(error = %err, "hardware watcher failed; notifications degraded");
                        let reason = match err {
                            CoreWatchError::WatcherUnavailable(reason) => reason,
                            other => other.to_string(),
                        };
                        break Exit::Degraded(reason);
                    }
                    None => {
                        info!("hardware watcher stream ended; shutting down");
                        break Exit::Shutdown(None);
                    }
                },
            }
        };

        // Status is published before any queue closes.
        let (status, reply) = match exit {
            Exit::Shutdown(reply) => (HubStatus::ShutDown, reply),
            Exit::Degraded(reason) => (HubStatus::Degraded(reason), None),
        };
        self.status_tx.send_replace(status.clone());

        self.source.stop();
        let closed = self.core.close_all();
        info!(closed, %status, "notification hub stopped; sessions closed");

        if let Some(reply) = reply {
            let _ = reply.send(());
        }
    }

    fn handle_command(&mut self, command: HubCommand) -> Option<Exit> {
        match command {
            HubCommand::Subscribe { filter, reply } => {
                let (id, receiver) = self.core.subscribe(filter);
                if reply.send((id, receiver)).is_err() {
                    // Caller gave up before the reply arrived.
                    self.core.unsubscribe(id);
                }
                None
            }
            HubCommand::Unsubscribe { id, reply } => {
                let removed = self.core.unsubscribe(id);
                let _ = reply.send(removed);
                None
            }
            HubCommand::Stats { reply } => {
                let status = self.status_tx.borrow().clone();
                let _ = reply.send(self.core.stats(status));
                None
            }
            HubCommand::Shutdown { reply } => Some(Exit::Shutdown(Some(reply))),
        }
    }

    async fn handle_raw_op(&mut self, op: RawOp) {
        let Some(event) = HubCore::classify(op) else {
            debug!(%op, "raw op does not map to a domain event");
            return;
        };

        info!(%op, "manually installed cores change detected");
        refresh(Arc::clone(&self.refresher)).await;

        let report = self.core.broadcast(event);
        debug!(
            sequence = report.sequence,
            kind = %event.kind(),
            delivered = report.delivered,
            filtered = report.filtered,
            overflowed = report.overflowed,
            pruned = report.pruned,
            "broadcast notification"
        );
    }
}

/// Run the refresher on the blocking pool and wait for it.
///
/// Failures are logged only; the notification is still broadcast.
async fn refresh(refresher: Arc<dyn Refresher>) {
    let result = tokio::task::spawn_blocking(move || {
        let instances = refresher.instance_ids();
        refresher.refresh(&instances)
    })
    .await;

    match result {
        Ok(Ok(())) => debug!("package refresh complete"),
        Ok(Err(err)) => warn!(error = %err, "package refresh failed; broadcasting anyway"),
        Err(err) => warn!(error = %err, "package refresh panicked; broadcasting anyway"),
    }
}
