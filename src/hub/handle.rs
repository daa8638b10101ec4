// src/hub/handle.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::errors::{CoreWatchError, Result};
use crate::refresh::Refresher;
use crate::types::{EventFilter, Notification, SubscriptionId};
use crate::watch::{ChangeSource, PathWatcher, RawOpStream, hardware_dir};

use super::core::HubCore;
use super::queue::EventReceiver;
use super::runtime::HubRuntime;
use super::{HubCommand, HubOptions, HubStats, HubStatus};

/// Cloneable client of the hub task.
///
/// Every operation is a control message to the hub; none of them touch the
/// registry directly.
#[derive(Clone)]
pub struct HubHandle {
    control_tx: mpsc::Sender<HubCommand>,
    status_rx: watch::Receiver<HubStatus>,
}

impl fmt::Debug for HubHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubHandle")
            .field("status", &*self.status_rx.borrow())
            .finish_non_exhaustive()
    }
}

impl HubHandle {
    pub fn status(&self) -> HubStatus {
        self.status_rx.borrow().clone()
    }

    pub fn is_available(&self) -> bool {
        matches!(*self.status_rx.borrow(), HubStatus::Available)
    }

    /// Register a new subscription with the given filter.
    ///
    /// Fails immediately with `WatcherUnavailable` once the watcher has
    /// failed, or `HubShutDown` after shutdown.
    pub async fn subscribe(&self, filter: EventFilter) -> Result<SubscriptionHandle> {
        if !self.is_available() {
            return Err(self.unavailable());
        }

        let (reply, rx) = oneshot::channel();
        self.control_tx
            .send(HubCommand::Subscribe { filter, reply })
            .await
            .map_err(|_| self.unavailable())?;
        let (id, receiver) = rx.await.map_err(|_| self.unavailable())?;

        Ok(SubscriptionHandle {
            id,
            receiver,
            hub: self.clone(),
        })
    }

    /// Close and remove a subscription.
    ///
    /// Idempotent: returns false if the id was unknown or the hub is gone,
    /// in which case the subscription is already closed.
    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .control_tx
            .send(HubCommand::Unsubscribe { id, reply })
            .await
            .is_err()
        {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    /// Snapshot of hub diagnostics.
    pub async fn stats(&self) -> Result<HubStats> {
        let (reply, rx) = oneshot::channel();
        self.control_tx
            .send(HubCommand::Stats { reply })
            .await
            .map_err(|_| self.unavailable())?;
        rx.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> CoreWatchError {
        match self.status() {
            HubStatus::Degraded(reason) => CoreWatchError::WatcherUnavailable(reason),
            HubStatus::Available | HubStatus::ShutDown => CoreWatchError::HubShutDown,
        }
    }
}

/// The process-scoped hub: owns the hub task and, through it, the watcher.
///
/// Construct once at daemon startup and pass it (or [`HubHandle`] clones) to
/// whatever serves client streams.
pub struct NotificationHub {
    handle: HubHandle,
    task: Option<JoinHandle<()>>,
    watched: Option<PathBuf>,
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationHub")
            .field("watched", &self.watched)
            .field("status", &self.handle.status())
            .finish()
    }
}

impl NotificationHub {
    /// Watch `<user_dir>/hardware` and start the hub task.
    ///
    /// Fails with `WatchSetup` if `user_dir` does not exist or the OS watch
    /// cannot be registered. The hardware directory is created if missing.
    pub fn start(
        user_dir: impl AsRef<Path>,
        refresher: Arc<dyn Refresher>,
        options: HubOptions,
    ) -> Result<Self> {
        let mut watcher =
            PathWatcher::create(hardware_dir(user_dir.as_ref()), options.watch.clone())?;
        let ops = watcher.start_streaming()?;
        let watched = watcher.path().to_path_buf();

        let mut hub = Self::with_source(watcher, ops, refresher, options);
        hub.watched = Some(watched);
        Ok(hub)
    }

    /// Start a hub over an arbitrary raw-op source.
    ///
    /// `source` is stopped when the hub shuts down or degrades.
    pub fn with_source<S: ChangeSource>(
        source: S,
        ops: RawOpStream,
        refresher: Arc<dyn Refresher>,
        options: HubOptions,
    ) -> Self {
        let (control_tx, control_rx) = mpsc::channel(options.control_buffer.max(1));
        let (status_tx, status_rx) = watch::channel(HubStatus::Available);

        let runtime = HubRuntime::new(
            HubCore::new(options.queue_capacity),
            Box::new(source),
            ops,
            control_rx,
            refresher,
            status_tx,
        );
        let task = tokio::spawn(runtime.run());

        Self {
            handle: HubHandle {
                control_tx,
                status_rx,
            },
            task: Some(task),
            watched: None,
        }
    }

    pub fn handle(&self) -> HubHandle {
        self.handle.clone()
    }

    /// Directory being watched, when started with [`NotificationHub::start`].
    pub fn watched_dir(&self) -> Option<&Path> {
        self.watched.as_deref()
    }

    pub fn status(&self) -> HubStatus {
        self.handle.status()
    }

    pub fn is_available(&self) -> bool {
        self.handle.is_available()
    }

    pub async fn subscribe(&self, filter: EventFilter) -> Result<SubscriptionHandle> {
        self.handle.subscribe(filter).await
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.handle.unsubscribe(id).await
    }

    pub async fn stats(&self) -> Result<HubStats> {
        self.handle.stats().await
    }

    /// Stop the watcher, close every subscription, and wait for the hub task.
    ///
    /// Calling this again is a no-op.
    pub async fn shutdown(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        let (reply, rx) = oneshot::channel();
        if self
            .handle
            .control_tx
            .send(HubCommand::Shutdown { reply })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }

        if let Err(err) = task.await {
            warn!(error = %err, "hub task ended abnormally");
        }
        info!("notification hub stopped");
    }
}

/// One subscriber's view: its id, its queue, and a way back to the hub.
pub struct SubscriptionHandle {
    id: SubscriptionId,
    receiver: EventReceiver,
    hub: HubHandle,
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("receiver", &self.receiver)
            .finish_non_exhaustive()
    }
}

impl SubscriptionHandle {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Next notification; `None` after unsubscribe or hub shutdown.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.receiver.recv().await
    }

    /// Resolves once the hub has closed this subscription.
    pub async fn closed(&self) {
        self.receiver.closed().await
    }

    pub fn try_recv(&mut self) -> Option<Notification> {
        self.receiver.try_recv()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.receiver.capacity()
    }

    pub fn dropped(&self) -> u64 {
        self.receiver.dropped()
    }

    pub fn is_closed(&self) -> bool {
        self.receiver.is_closed()
    }

    /// Remove this subscription from the hub. Idempotent.
    pub async fn unsubscribe(&self) -> bool {
        self.hub.unsubscribe(self.id).await
    }
}
