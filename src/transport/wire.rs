//! Wire representation of a message envelope.
//!
//! A record carries the payload discriminant plus exactly one populated
//! content field, the properties and the id. The ack id never goes on the
//! wire.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::message::{Message, Payload, PayloadType};
use crate::utils::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePayload {
    pub message_format: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_payload: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub message_id: String,
    pub payload: WirePayload,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// A wire message addressed to a destination, with transport-level headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub destination: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub message: WireMessage,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let payload = match message.payload() {
            Payload::Json(text) | Payload::String(text) => WirePayload {
                message_format: message.payload_type().discriminant(),
                string_payload: Some(text.clone()),
                binary_payload: None,
            },
            Payload::Binary(bytes) => WirePayload {
                message_format: PayloadType::Binary.discriminant(),
                string_payload: None,
                binary_payload: Some(bytes.to_vec()),
            },
        };

        WireMessage {
            message_id: message.message_id().to_string(),
            payload,
            properties: message.properties().clone(),
        }
    }
}

impl TryFrom<WireMessage> for Message {
    type Error = TransportError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let format = wire.payload.message_format;
        let tag = PayloadType::from_discriminant(format)
            .ok_or(TransportError::UnknownPayloadType(format))?;

        let payload = match (tag, wire.payload.string_payload, wire.payload.binary_payload) {
            (PayloadType::Json, Some(text), None) => Payload::Json(text),
            (PayloadType::String, Some(text), None) => Payload::String(text),
            (PayloadType::Binary, None, Some(bytes)) => Payload::Binary(bytes.into()),
            (tag, _, _) => return Err(TransportError::MissingPayloadContent(tag)),
        };

        Ok(Message::from_parts(wire.message_id, payload, wire.properties))
    }
}

impl Frame {
    pub fn new(destination: &str, message: &Message, headers: HashMap<String, String>) -> Self {
        Self {
            destination: destination.to_string(),
            headers,
            message: WireMessage::from(message),
        }
    }

    pub fn encode(&self) -> Result<String, TransportError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, TransportError> {
        Ok(serde_json::from_str(text)?)
    }
}
