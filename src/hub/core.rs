// src/hub/core.rs

//! Pure hub state.
//!
//! [`HubCore`] owns the subscription registry and the emission counter. It
//! classifies raw operations and fans domain events out to subscription
//! queues, but has no channels, no tasks and performs no IO. The async shell
//! in [`super::runtime`] is its only owner at run time, which is what keeps
//! registry mutation race-free.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::hub::queue::{EventReceiver, EventSender, PushOutcome, event_queue};
use crate::hub::{HubStatus, HubStats, SubscriptionStats};
use crate::types::{DomainEvent, EventFilter, Notification, SubscriptionId};
use crate::watch::RawOp;

#[derive(Debug)]
struct Subscriber {
    filter: EventFilter,
    queue: EventSender,
}

/// What happened to one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sequence: u64,
    /// Subscriptions the notification was queued for.
    pub delivered: usize,
    /// Subscriptions whose filter rejected the event.
    pub filtered: usize,
    /// Subscriptions that had to evict their oldest notification.
    pub overflowed: usize,
    /// Subscriptions removed because their receiver was gone.
    pub pruned: usize,
}

#[derive(Debug)]
pub struct HubCore {
    registry: BTreeMap<SubscriptionId, Subscriber>,
    next_id: u64,
    emitted: u64,
    queue_capacity: usize,
}

impl HubCore {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            registry: BTreeMap::new(),
            next_id: 1,
            emitted: 0,
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Turn a raw operation into at most one domain event.
    pub fn classify(op: RawOp) -> Option<DomainEvent> {
        match op {
            RawOp::Create | RawOp::Write | RawOp::Remove | RawOp::Rename => {
                Some(DomainEvent::CoreChanged)
            }
            RawOp::Other => None,
        }
    }

    pub fn subscribe(&mut self, filter: EventFilter) -> (SubscriptionId, EventReceiver) {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let (queue, receiver) = event_queue(self.queue_capacity);
        debug!(subscription = %id, ?filter, "subscription added");
        self.registry.insert(id, Subscriber { filter, queue });
        (id, receiver)
    }

    /// Remove a subscription and close its queue. Returns false if unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.registry.remove(&id) {
            Some(subscriber) => {
                subscriber.queue.close();
                debug!(subscription = %id, "subscription removed");
                true
            }
            None => false,
        }
    }

    /// Stamp `event` with the next sequence number and queue it for every
    /// subscription whose filter accepts it.
    pub fn broadcast(&mut self, event: DomainEvent) -> BroadcastReport {
        self.emitted += 1;
        let notification = Notification {
            sequence: self.emitted,
            event,
        };

        let mut report = BroadcastReport {
            sequence: notification.sequence,
            ..BroadcastReport::default()
        };
        let mut gone = Vec::new();

        for (id, subscriber) in self.registry.iter() {
            if subscriber.queue.receiver_dropped() {
                gone.push(*id);
                continue;
            }
            if !subscriber.filter.accepts(event.kind()) {
                report.filtered += 1;
                continue;
            }
            match subscriber.queue.push(notification) {
                PushOutcome::Queued => report.delivered += 1,
                PushOutcome::DroppedOldest => {
                    report.delivered += 1;
                    report.overflowed += 1;
                    warn!(
                        subscription = %id,
                        dropped = subscriber.queue.dropped(),
                        "subscriber queue full; dropped oldest notification"
                    );
                }
                PushOutcome::Closed => gone.push(*id),
            }
        }

        for id in gone {
            if self.unsubscribe(id) {
                debug!(subscription = %id, "pruned subscription with no receiver");
                report.pruned += 1;
            }
        }

        report
    }

    /// Close and remove every subscription. Returns how many were closed.
    pub fn close_all(&mut self) -> usize {
        let registry = std::mem::take(&mut self.registry);
        let closed = registry.len();
        for (_, subscriber) in registry {
            subscriber.queue.close();
        }
        closed
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    pub fn events_emitted(&self) -> u64 {
        self.emitted
    }

    pub fn stats(&self, status: HubStatus) -> HubStats {
        HubStats {
            status,
            events_emitted: self.emitted,
            subscriptions: self
                .registry
                .iter()
                .map(|(id, s)| SubscriptionStats {
                    id: *id,
                    filter: s.filter.clone(),
                    queued: s.queue.len(),
                    dropped: s.queue.dropped(),
                })
                .collect(),
        }
    }
}
