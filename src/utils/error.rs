//! The `error` module defines the error types used within `messagebus`.
//!
//! Each layer has its own enum: `MessageError` for the envelope itself,
//! `TransportError` for moving envelopes on and off the wire, and
//! `ClientError` for the publishing facade. `#[from]` conversions let `?`
//! carry a lower-layer failure upwards.

use thiserror::Error;

use crate::message::PayloadType;

/// Errors raised by the message envelope.
#[derive(Debug, Error)]
pub enum MessageError {
    /// A typed accessor was called for a kind the envelope does not hold.
    #[error("cannot get {requested} payload from {actual} payload type message")]
    PayloadTypeMismatch {
        requested: PayloadType,
        actual: PayloadType,
    },

    /// The JSON encoder rejected the object handed to a JSON constructor.
    #[error("failed to serialize JSON payload: {0}")]
    SerializationFailure(#[from] serde_json::Error),
}

/// Errors raised while encoding, decoding or routing envelopes.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unknown payload type discriminant: {0}")]
    UnknownPayloadType(i32),

    /// The wire record's populated fields do not match its tag: the
    /// expected field is empty or the other one is also set.
    #[error("payload content does not match its {0} tag")]
    MissingPayloadContent(PayloadType),

    #[error("wire codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("destination '{0}' is not open")]
    UnknownDestination(String),

    #[error("consumer '{0}' is disconnected")]
    Disconnected(String),
}

/// Errors raised by the publishing client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("destination '{0}' not found")]
    InvalidDestination(String),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
