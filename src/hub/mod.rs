// src/hub/mod.rs

//! Notification hub.
//!
//! This module ties together:
//! - the directory watcher's raw-op stream
//! - classification of raw ops into domain events
//! - the refresh hook that runs before every broadcast
//! - the subscription registry and per-subscription fan-out
//!
//! The pure registry/broadcast state lives in [`core`]; the single-owner
//! async loop is implemented in [`runtime`]; [`handle`] is the public,
//! cloneable API that talks to that loop over a control channel.

use std::fmt;

use tokio::sync::oneshot;

use crate::types::{EventFilter, SubscriptionId};
use crate::watch::WatchOptions;

pub mod core;
pub mod handle;
pub mod queue;
pub mod runtime;

pub use core::{BroadcastReport, HubCore};
pub use handle::{HubHandle, NotificationHub, SubscriptionHandle};
pub use queue::{EventReceiver, EventSender, PushOutcome, event_queue};
pub use runtime::HubRuntime;

/// Availability of the hub as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubStatus {
    Available,
    /// The watcher failed after setup; no further events will be produced.
    Degraded(String),
    ShutDown,
}

impl fmt::Display for HubStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubStatus::Available => f.write_str("available"),
            HubStatus::Degraded(reason) => write!(f, "degraded ({reason})"),
            HubStatus::ShutDown => f.write_str("shut down"),
        }
    }
}

/// Per-subscription diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionStats {
    pub id: SubscriptionId,
    pub filter: EventFilter,
    pub queued: usize,
    pub dropped: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubStats {
    pub status: HubStatus,
    pub events_emitted: u64,
    pub subscriptions: Vec<SubscriptionStats>,
}

/// Hub tuning knobs, usually built from `[notifications]`.
#[derive(Debug, Clone)]
pub struct HubOptions {
    /// Bound of each subscription's delivery queue.
    pub queue_capacity: usize,
    /// Bound of the control channel into the hub task.
    pub control_buffer: usize,
    pub watch: WatchOptions,
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            control_buffer: 32,
            watch: WatchOptions::default(),
        }
    }
}

/// Control messages processed by the hub task, interleaved with raw ops.
#[derive(Debug)]
pub(crate) enum HubCommand {
    Subscribe {
        filter: EventFilter,
        reply: oneshot::Sender<(SubscriptionId, EventReceiver)>,
    },
    Unsubscribe {
        id: SubscriptionId,
        reply: oneshot::Sender<bool>,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}
