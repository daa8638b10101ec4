// src/hub/queue.rs

//! Bounded per-subscription delivery queue.
//!
//! Single producer (the hub task), single consumer (one session). When the
//! queue is full the oldest notification is discarded and counted, so a slow
//! consumer never blocks the hub or any other subscriber.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::types::Notification;

#[derive(Debug, Default)]
struct QueueState {
    items: VecDeque<Notification>,
    closed: bool,
    dropped: u64,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<QueueState>,
    capacity: usize,
    ready: Notify,
    receiver_alive: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Result of pushing one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Queued after evicting the oldest pending notification.
    DroppedOldest,
    /// The queue is closed or its receiver is gone; nothing was queued.
    Closed,
}

/// Create a queue holding at most `capacity` notifications (at least 1).
pub fn event_queue(capacity: usize) -> (EventSender, EventReceiver) {
    let shared = Arc::new(Shared {
        state: Mutex::new(QueueState::default()),
        capacity: capacity.max(1),
        ready: Notify::new(),
        receiver_alive: AtomicBool::new(true),
    });
    (
        EventSender {
            shared: Arc::clone(&shared),
        },
        EventReceiver { shared },
    )
}

/// Hub side of a delivery queue. Dropping it closes the queue.
pub struct EventSender {
    shared: Arc<Shared>,
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("capacity", &self.shared.capacity)
            .finish_non_exhaustive()
    }
}

impl EventSender {
    pub fn push(&self, notification: Notification) -> PushOutcome {
        let outcome = {
            let mut state = self.shared.lock();
            if state.closed || !self.shared.receiver_alive.load(Ordering::Acquire) {
                return PushOutcome::Closed;
            }

            let mut outcome = PushOutcome::Queued;
            if state.items.len() >= self.shared.capacity {
                state.items.pop_front();
                state.dropped += 1;
                outcome = PushOutcome::DroppedOldest;
            }
            state.items.push_back(notification);
            outcome
        };

        self.shared.ready.notify_one();
        outcome
    }

    /// Mark end-of-stream. Already queued notifications stay readable.
    pub fn close(&self) {
        {
            let mut state = self.shared.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.shared.ready.notify_one();
    }

    /// True once the consuming side has been dropped.
    pub fn receiver_dropped(&self) -> bool {
        !self.shared.receiver_alive.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dropped(&self) -> u64 {
        self.shared.lock().dropped
    }
}

impl Drop for EventSender {
    fn drop(&mut self) {
        self.close();
    }
}

/// Read-only consumer view of a delivery queue.
pub struct EventReceiver {
    shared: Arc<Shared>,
}

impl fmt::Debug for EventReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("EventReceiver")
            .field("len", &state.items.len())
            .field("capacity", &self.shared.capacity)
            .field("dropped", &state.dropped)
            .field("closed", &state.closed)
            .finish()
    }
}

impl EventReceiver {
    /// Wait for the next notification.
    ///
    /// Returns `None` once the queue is closed and fully drained.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            {
                let mut state = self.shared.lock();
                if let Some(next) = state.items.pop_front() {
                    return Some(next);
                }
                if state.closed {
                    return None;
                }
            }
            // A push between the check above and this await leaves a permit,
            // so the wakeup is not lost.
            self.shared.ready.notified().await;
        }
    }

    /// Wait until end-of-stream has been signalled, without taking items.
    pub async fn closed(&self) {
        loop {
            if self.shared.lock().closed {
                return;
            }
            self.shared.ready.notified().await;
        }
    }

    /// Take the next notification without waiting.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.shared.lock().items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Notifications evicted because this queue was full.
    pub fn dropped(&self) -> u64 {
        self.shared.lock().dropped
    }

    /// True once end-of-stream has been signalled (items may remain).
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl Drop for EventReceiver {
    fn drop(&mut self) {
        self.shared.receiver_alive.store(false, Ordering::Release);
    }
}
