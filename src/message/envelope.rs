use std::collections::HashMap;

use bytes::Bytes;
use serde::Serialize;

use crate::message::id::generate_message_id;
use crate::message::payload_type::PayloadType;
use crate::utils::error::MessageError;

/// The content of a message, tagged with its encoding.
///
/// JSON payloads are always held as already-serialized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Json(String),
    Binary(Bytes),
    String(String),
}

impl Payload {
    /// The tag matching this variant.
    pub fn payload_type(&self) -> PayloadType {
        match self {
            Payload::Json(_) => PayloadType::Json,
            Payload::Binary(_) => PayloadType::Binary,
            Payload::String(_) => PayloadType::String,
        }
    }
}

/// A message envelope as it travels over the bus.
///
/// The id and payload are fixed when the message is built through one of the
/// `create_*` constructors. Properties are application headers set by the
/// producer before handoff; the ack id is stamped by the consuming transport
/// after receipt and is never sent on the wire.
///
/// # Example
///
/// ```rust
/// use messagebus::message::{Message, PayloadType};
///
/// let msg = Message::create_string_message_with_id("m1", "hello");
/// assert_eq!(msg.message_id(), "m1");
/// assert_eq!(msg.payload_type(), PayloadType::String);
/// assert_eq!(msg.string_payload().unwrap(), "hello");
/// assert!(msg.binary_payload().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    message_id: String,
    payload: Payload,
    properties: HashMap<String, String>,
    ack_id: Option<String>,
}

impl Message {
    fn new(message_id: String, payload: Payload) -> Self {
        Self {
            message_id,
            payload,
            properties: HashMap::new(),
            ack_id: None,
        }
    }

    /// Rebuilds an envelope from decoded parts. Used by wire decoders.
    pub(crate) fn from_parts(
        message_id: String,
        payload: Payload,
        properties: HashMap<String, String>,
    ) -> Self {
        Self {
            message_id,
            payload,
            properties,
            ack_id: None,
        }
    }

    /// Builds a STRING message with a generated id.
    pub fn create_string_message(payload: impl Into<String>) -> Self {
        Self::create_string_message_with_id(generate_message_id(), payload)
    }

    /// Builds a STRING message with a caller-supplied id.
    pub fn create_string_message_with_id(
        message_id: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self::new(message_id.into(), Payload::String(payload.into()))
    }

    /// Builds a BINARY message with a generated id.
    pub fn create_binary_message(payload: impl Into<Bytes>) -> Self {
        Self::create_binary_message_with_id(generate_message_id(), payload)
    }

    /// Builds a BINARY message with a caller-supplied id.
    pub fn create_binary_message_with_id(
        message_id: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self::new(message_id.into(), Payload::Binary(payload.into()))
    }

    /// Serializes `payload` to JSON and wraps the resulting text.
    ///
    /// Date fields should be annotated with
    /// [`json_date`](crate::message::json_date) so every client agrees on
    /// their layout.
    pub fn create_json_message<T>(payload: &T) -> Result<Self, MessageError>
    where
        T: Serialize + ?Sized,
    {
        Self::create_json_message_with_id(generate_message_id(), payload)
    }

    /// Same as [`create_json_message`](Self::create_json_message) with a
    /// caller-supplied id. Fails with `SerializationFailure` when `payload`
    /// cannot be encoded.
    pub fn create_json_message_with_id<T>(
        message_id: impl Into<String>,
        payload: &T,
    ) -> Result<Self, MessageError>
    where
        T: Serialize + ?Sized,
    {
        Self::create_json_message_with_encoder(message_id, payload, serde_json::to_string)
    }

    /// Like [`create_json_message_with_id`](Self::create_json_message_with_id)
    /// but with a caller-supplied encoder.
    pub fn create_json_message_with_encoder<T, F>(
        message_id: impl Into<String>,
        payload: &T,
        encoder: F,
    ) -> Result<Self, MessageError>
    where
        T: ?Sized,
        F: FnOnce(&T) -> Result<String, serde_json::Error>,
    {
        let json = encoder(payload)?;
        Ok(Self::new(message_id.into(), Payload::Json(json)))
    }

    /// Wraps text that is already JSON. The text is stored verbatim.
    pub fn create_json_string_message(json: impl Into<String>) -> Self {
        Self::create_json_string_message_with_id(generate_message_id(), json)
    }

    /// Wraps JSON text verbatim under a caller-supplied id.
    pub fn create_json_string_message_with_id(
        message_id: impl Into<String>,
        json: impl Into<String>,
    ) -> Self {
        Self::new(message_id.into(), Payload::Json(json.into()))
    }

    /// The id assigned at construction.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn payload_type(&self) -> PayloadType {
        self.payload.payload_type()
    }

    /// Borrows the tagged payload for pattern matching.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the text of a STRING message.
    ///
    /// Any other kind, JSON included, fails with `PayloadTypeMismatch`.
    pub fn string_payload(&self) -> Result<&str, MessageError> {
        match &self.payload {
            Payload::String(text) => Ok(text),
            other => Err(mismatch(PayloadType::String, other)),
        }
    }

    /// Returns the raw JSON text. Decoding it is left to the caller.
    pub fn json_string_payload(&self) -> Result<&str, MessageError> {
        match &self.payload {
            Payload::Json(text) => Ok(text),
            other => Err(mismatch(PayloadType::Json, other)),
        }
    }

    /// Returns the bytes of a BINARY message, or `PayloadTypeMismatch`.
    pub fn binary_payload(&self) -> Result<&Bytes, MessageError> {
        match &self.payload {
            Payload::Binary(bytes) => Ok(bytes),
            other => Err(mismatch(PayloadType::Binary, other)),
        }
    }

    /// Replaces all properties. No merge takes place.
    pub fn set_properties(&mut self, properties: HashMap<String, String>) {
        self.properties = properties;
    }

    /// The application headers last set on this message.
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// The consumer-side ack token; `None` on messages built by a producer.
    pub fn ack_id(&self) -> Option<&str> {
        self.ack_id.as_deref()
    }

    /// Stamps the ack token. The value is opaque and not validated.
    pub fn set_ack_id(&mut self, ack_id: impl Into<String>) {
        self.ack_id = Some(ack_id.into());
    }
}

fn mismatch(requested: PayloadType, actual: &Payload) -> MessageError {
    MessageError::PayloadTypeMismatch {
        requested,
        actual: actual.payload_type(),
    }
}
