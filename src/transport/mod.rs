//! The `transport` module moves envelopes between producers and consumers.
//!
//! It defines the wire record exchanged with the broker, the `Transport`
//! seam the client publishes through, and an in-process loopback
//! implementation of that seam.

use std::collections::HashMap;

use crate::message::Message;
use crate::utils::error::TransportError;

pub mod loopback;
pub mod wire;

pub use loopback::{Consumer, Delivery, LoopbackTransport};
pub use wire::{Frame, WireMessage, WirePayload};

/// Something that can carry messages to named destinations.
///
/// Implementations never look at a message's ack id; consumers stamp it on
/// receipt through [`Message::set_ack_id`].
pub trait Transport: Send + Sync {
    fn open(&self, destination: &str) -> Result<(), TransportError>;

    fn close(&self, destination: &str);

    fn send(
        &self,
        destination: &str,
        message: &Message,
        headers: HashMap<String, String>,
    ) -> Result<(), TransportError>;
}
