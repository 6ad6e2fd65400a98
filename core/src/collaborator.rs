//! Seams to the collaborators that live outside this crate.
//!
//! RULE: The adapter only talks to the outside through these traits.
//! The transport delivers and sends tuples; the view reads the store.

use crate::{error::CacheResult, message::OutboundMessage, store::EntityStore};

/// Outbound half of the transport.
pub trait Transport {
    /// Send one request. An error leaves the message queued for retry.
    fn send(&mut self, msg: &OutboundMessage) -> CacheResult<()>;
}

/// Whatever displays the model.
pub trait DataView {
    /// Called once after every inbound message has been applied.
    /// Implementations poll `store.modified()` or the quantity reads to
    /// find out what changed.
    fn data_updated(&mut self, store: &EntityStore);
}

/// A view that ignores updates.
#[derive(Debug, Default)]
pub struct NullView;

impl DataView for NullView {
    fn data_updated(&mut self, _store: &EntityStore) {}
}

/// A transport that records every message it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<OutboundMessage>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, msg: &OutboundMessage) -> CacheResult<()> {
        self.sent.push(msg.clone());
        Ok(())
    }
}
