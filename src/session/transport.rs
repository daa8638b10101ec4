// src/session/transport.rs

//! Pluggable delivery transport.
//!
//! A session talks to a `Transport` instead of a concrete RPC stream. This
//! keeps stream framing out of this crate and makes it easy to swap in a
//! recording or failing transport in tests.
//!
//! - [`ChannelTransport`] forwards notifications over an mpsc channel, which
//!   is how an RPC server task usually hands them to its response stream.
//! - [`LineTransport`] writes one text line per notification to any
//!   `AsyncWrite`; the binary uses it for stdout.

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::errors::{CoreWatchError, Result};
use crate::types::Notification;

/// Boxed future returned by [`Transport`] methods.
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// One client's outbound stream.
pub trait Transport: Send {
    /// Write one notification. An error ends the session.
    fn send(&mut self, notification: Notification) -> TransportFuture<'_>;

    /// Close the stream normally after end-of-stream.
    fn close(&mut self) -> TransportFuture<'_> {
        Box::pin(async { Ok(()) })
    }
}

/// Forwards notifications to an mpsc receiver held by the RPC layer.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Notification>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx }
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, notification: Notification) -> TransportFuture<'_> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            tx.send(notification)
                .await
                .map_err(|_| CoreWatchError::TransportWrite("client stream closed".to_string()))
        })
    }
}

/// Writes `"<sequence> <KIND>\n"` per notification.
#[derive(Debug)]
pub struct LineTransport<W> {
    writer: W,
}

impl<W> LineTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W> Transport for LineTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn send(&mut self, notification: Notification) -> TransportFuture<'_> {
        Box::pin(async move {
            let line = format!("{} {}\n", notification.sequence, notification.kind());
            self.writer
                .write_all(line.as_bytes())
                .await
                .map_err(|e| CoreWatchError::TransportWrite(e.to_string()))?;
            self.writer
                .flush()
                .await
                .map_err(|e| CoreWatchError::TransportWrite(e.to_string()))
        })
    }

    fn close(&mut self) -> TransportFuture<'_> {
        Box::pin(async move {
            self.writer
                .shutdown()
                .await
                .map_err(|e| CoreWatchError::TransportWrite(e.to_string()))
        })
    }
}
