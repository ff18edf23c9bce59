//! Transport boundary
//!
//! The connection layer is owned by the host and may run on its own threads.
//! It hands inbound messages to the simulation thread through an `Inbox` and
//! receives outbound messages through a `FrameSink`. Delivery is assumed
//! reliable and ordered per connection.

use crate::error::{Error, Result};
use bytes::Bytes;
use levelsync_core::EditorId;
use std::sync::mpsc;

/// A message received from the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Editor whose actions the payload carries
    pub origin: EditorId,
    pub payload: Bytes,
}

/// A message to send to one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    /// Connection that should receive the payload
    pub target: EditorId,
    /// Editor whose actions the payload carries
    pub origin: EditorId,
    pub payload: Bytes,
}

/// Thread-safe producer side of an inbox
#[derive(Debug, Clone)]
pub struct InboxSender {
    tx: mpsc::Sender<InboundFrame>,
}

impl InboxSender {
    /// Hand a received message to the simulation thread
    pub fn send(&self, origin: EditorId, payload: impl Into<Bytes>) -> Result<()> {
        self.tx
            .send(InboundFrame {
                origin,
                payload: payload.into(),
            })
            .map_err(|_| Error::Transport("inbox closed".to_string()))
    }
}

/// Simulation-side receiver, drained once per tick
#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::Receiver<InboundFrame>,
}

impl Inbox {
    /// Take every frame that has arrived, without blocking
    pub fn drain(&self) -> impl Iterator<Item = InboundFrame> + '_ {
        self.rx.try_iter()
    }
}

/// Create a connected inbox pair
pub fn inbox() -> (InboxSender, Inbox) {
    let (tx, rx) = mpsc::channel();
    (InboxSender { tx }, Inbox { rx })
}

/// Outbound side implemented by the host transport
pub trait FrameSink {
    fn send_frame(&mut self, frame: OutboundFrame) -> Result<()>;
}

impl FrameSink for Vec<OutboundFrame> {
    fn send_frame(&mut self, frame: OutboundFrame) -> Result<()> {
        self.push(frame);
        Ok(())
    }
}
