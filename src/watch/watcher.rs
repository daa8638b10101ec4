// src/watch/watcher.rs

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::errors::{CoreWatchError, Result};
use crate::watch::patterns::IgnoreSet;
use crate::watch::raw::RawOp;

/// Item carried on a raw-op stream.
///
/// An `Err` is always the last item: the stream closes right after it. A
/// stream that closes without an `Err` ended gracefully.
pub type RawOpItem = std::result::Result<RawOp, CoreWatchError>;

/// Settings for a [`PathWatcher`].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Capacity of the raw-op channel towards the consumer.
    pub buffer: usize,
    /// File names that never produce a raw op.
    pub ignore: IgnoreSet,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            buffer: 64,
            ignore: IgnoreSet::default(),
        }
    }
}

/// Ordered sequence of raw operations produced by a watch source.
#[derive(Debug)]
pub struct RawOpStream {
    rx: mpsc::Receiver<RawOpItem>,
}

impl RawOpStream {
    /// Next raw operation; `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<RawOpItem> {
        self.rx.recv().await
    }
}

/// Producer side of a [`RawOpStream`] for sources other than the OS watcher.
#[derive(Debug, Clone)]
pub struct RawOpSender {
    tx: mpsc::Sender<RawOpItem>,
}

impl RawOpSender {
    /// Push one operation. Fails if the stream has been dropped.
    pub async fn send(&self, op: RawOp) -> Result<()> {
        self.tx
            .send(Ok(op))
            .await
            .map_err(|_| CoreWatchError::HubShutDown)
    }

    /// Terminate the stream with a backend error.
    pub async fn fail(self, reason: impl Into<String>) {
        let _ = self
            .tx
            .send(Err(CoreWatchError::WatcherUnavailable(reason.into())))
            .await;
    }
}

/// Create a raw-op channel with the given capacity (clamped to at least 1).
pub fn raw_op_channel(capacity: usize) -> (RawOpSender, RawOpStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (RawOpSender { tx }, RawOpStream { rx })
}

/// Something the hub owns and must stop on shutdown.
pub trait ChangeSource: Send + 'static {
    /// Release the underlying resource and end the associated stream.
    ///
    /// Must be idempotent.
    fn stop(&mut self);
}

/// Watches exactly one directory, non-recursively.
///
/// Owns the OS watch handle. Events are buffered from creation on, and are
/// delivered once [`PathWatcher::start_streaming`] has been called.
pub struct PathWatcher {
    path: PathBuf,
    inner: Option<RecommendedWatcher>,
    events: Option<mpsc::Receiver<notify::Result<Event>>>,
    stop_tx: Option<oneshot::Sender<()>>,
    options: WatchOptions,
    running: bool,
}

impl fmt::Debug for PathWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathWatcher")
            .field("path", &self.path)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl PathWatcher {
    /// Resolve `dir`, creating it if needed, and register the OS watch.
    ///
    /// The parent of `dir` is the configured root and must already exist;
    /// only `dir` itself is ever created here.
    pub fn create(dir: impl Into<PathBuf>, options: WatchOptions) -> Result<Self> {
        let dir = dir.into();
        prepare_dir(&dir)?;

        // Bounded channel from the notify callback thread into the async world.
        // The callback must never block, since `unwatch` in `stop` waits on it.
        let (event_tx, event_rx) = mpsc::channel::<notify::Result<Event>>(options.buffer.max(1));

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match event_tx.try_send(res) {
                Ok(()) => {}
                // Pending events already lead to a refresh that sees this change.
                Err(mpsc::error::TrySendError::Full(dropped)) => {
                    warn!(event = ?dropped, "watch event buffer full; dropping event");
                }
                // The receiver is gone once the watcher has been stopped.
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            },
            Config::default(),
        )
        .map_err(|e| CoreWatchError::watch_setup(&dir, e))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| CoreWatchError::watch_setup(&dir, e))?;

        info!("hardware dir watcher registered on {:?}", dir);

        Ok(Self {
            path: dir,
            inner: Some(watcher),
            events: Some(event_rx),
            stop_tx: None,
            options,
            running: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Begin delivering raw operations in emission order.
    ///
    /// Can be called once; later calls fail with `AlreadyStreaming`.
    pub fn start_streaming(&mut self) -> Result<RawOpStream> {
        if !self.running {
            return Err(CoreWatchError::WatcherUnavailable(
                "watcher already stopped".to_string(),
            ));
        }
        let events = self.events.take().ok_or(CoreWatchError::AlreadyStreaming)?;

        let (sender, stream) = raw_op_channel(self.options.buffer);
        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);

        tokio::spawn(forward_raw_ops(
            self.path.clone(),
            events,
            sender.tx,
            stop_rx,
            self.options.ignore.clone(),
        ));

        info!("starting hardware dir watcher");
        Ok(stream)
    }

    /// Release the OS watch and end the output stream gracefully.
    ///
    /// Calling this again is a no-op.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;

        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(mut watcher) = self.inner.take() {
            if let Err(err) = watcher.unwatch(&self.path) {
                debug!(error = %err, "unwatch failed during stop");
            }
        }
        self.events = None;

        info!("stopping hardware dir watcher on {:?}", self.path);
    }
}

impl ChangeSource for PathWatcher {
    fn stop(&mut self) {
        PathWatcher::stop(self);
    }
}

impl Drop for PathWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn prepare_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Err(CoreWatchError::watch_setup(dir, "path is not set"));
    }

    let root = match dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !root.is_dir() {
        return Err(CoreWatchError::watch_setup(
            dir,
            format!("configured root {root:?} does not exist"),
        ));
    }

    if dir.exists() {
        if !dir.is_dir() {
            return Err(CoreWatchError::watch_setup(dir, "not a directory"));
        }
        return Ok(());
    }

    fs::create_dir_all(dir)
        .map_err(|e| CoreWatchError::watch_setup(dir, format!("creating directory: {e}")))?;
    debug!(?dir, "created watched directory");
    Ok(())
}

/// Watch loop: turns notify events into raw ops until stopped or failed.
async fn forward_raw_ops(
    path: PathBuf,
    mut events: mpsc::Receiver<notify::Result<Event>>,
    tx: mpsc::Sender<RawOpItem>,
    mut stop_rx: oneshot::Receiver<()>,
    ignore: IgnoreSet,
) {
    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                debug!("watcher stop requested");
                break;
            }
            next = events.recv() => match next {
                None => {
                    debug!("notify event channel closed");
                    break;
                }
                Some(Ok(event)) => {
                    let op = RawOp::from_event_kind(&event.kind);
                    if !op.is_significant() {
                        debug!(kind = ?event.kind, "dropping non-content event");
                        continue;
                    }
                    if ignore.ignores_all(&event.paths) {
                        debug!(paths = ?event.paths, "dropping ignored event");
                        continue;
                    }
                    debug!(%op, paths = ?event.paths, "raw op");
                    if tx.send(Ok(op)).await.is_err() {
                        debug!("raw op consumer gone");
                        break;
                    }
                }
                Some(Err(err)) => {
                    warn!(error = %err, "watching hardware folder failed");
                    let _ = tx
                        .send(Err(CoreWatchError::WatcherUnavailable(err.to_string())))
                        .await;
                    break;
                }
            }
        }
    }

    info!("hardware dir watcher on {:?} finished", path);
}
