// src/session/mod.rs

//! Per-client delivery.
//!
//! A [`SubscriptionSession`] adapts one hub subscription to one outbound
//! stream. Its failures stay local: a broken transport unsubscribes only
//! this session, never the hub, the watcher, or any other session.

pub mod transport;

use std::future::{Future, pending};

use tracing::{debug, info, warn};

use crate::hub::SubscriptionHandle;
use crate::types::SubscriptionId;

pub use transport::{ChannelTransport, LineTransport, Transport, TransportFuture};

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The subscription reached end-of-stream (unsubscribe or hub shutdown).
    Completed,
    /// The caller's cancellation future resolved (client disconnected).
    Cancelled,
    /// Writing to the transport failed.
    TransportFailed(String),
}

impl SessionOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, SessionOutcome::TransportFailed(_))
    }
}

/// Pull loop moving notifications from one subscription to one transport.
#[derive(Debug)]
pub struct SubscriptionSession<T: Transport> {
    subscription: SubscriptionHandle,
    transport: T,
}

impl<T: Transport> SubscriptionSession<T> {
    pub fn new(subscription: SubscriptionHandle, transport: T) -> Self {
        Self {
            subscription,
            transport,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.subscription.id()
    }

    /// Deliver until end-of-stream or a transport failure.
    pub async fn run(self) -> SessionOutcome {
        self.run_until(pending::<()>()).await
    }

    /// Deliver until end-of-stream, a transport failure, or `cancelled`
    /// resolves. Cancellation and failure unsubscribe this session only.
    pub async fn run_until<F>(mut self, cancelled: F) -> SessionOutcome
    where
        F: Future<Output = ()>,
    {
        let id = self.subscription.id();
        info!(subscription = %id, "notification session started");
        tokio::pin!(cancelled);

        let outcome = loop {
            let notification = tokio::select! {
                _ = &mut cancelled => break SessionOutcome::Cancelled,
                next = self.subscription.recv() => match next {
                    None => break SessionOutcome::Completed,
                    Some(notification) => notification,
                },
            };

            debug!(
                subscription = %id,
                sequence = notification.sequence,
                kind = %notification.kind(),
                "sending notification"
            );

            // A client that stops reading must still see cancellation and
            // shutdown. A ready transport wins over a closed subscription, so
            // queued items are still drained.
            tokio::select! {
                biased;

                _ = &mut cancelled => break SessionOutcome::Cancelled,
                sent = self.transport.send(notification) => {
                    if let Err(err) = sent {
                        warn!(subscription = %id, error = %err, "notification stream write failed");
                        break SessionOutcome::TransportFailed(err.to_string());
                    }
                }
                _ = self.subscription.closed() => {
                    debug!(subscription = %id, "subscription closed while transport was stalled");
                    break SessionOutcome::Completed;
                }
            }
        };

        match &outcome {
            SessionOutcome::Completed => {
                tokio::select! {
                    _ = &mut cancelled => {
                        debug!(subscription = %id, "client left before the stream was closed");
                    }
                    closed = self.transport.close() => {
                        if let Err(err) = closed {
                            debug!(subscription = %id, error = %err, "closing notification stream failed");
                        }
                    }
                }
            }
            SessionOutcome::Cancelled | SessionOutcome::TransportFailed(_) => {
                self.subscription.unsubscribe().await;
            }
        }

        info!(subscription = %id, ?outcome, "notification session finished");
        outcome
    }
}
