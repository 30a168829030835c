//! The `message` module defines the envelope every producer and consumer
//! exchanges with the bus.
//!
//! - `PayloadType`: the three payload encodings and their wire discriminants.
//! - `Message` / `Payload`: the envelope and its tagged content.
//! - `json_date`: serde helpers for the fixed date layout of JSON payloads.
//! - `id`: message id generation.

pub mod envelope;
pub mod id;
pub mod json_date;
pub mod payload_type;

pub use envelope::{Message, Payload};
pub use id::{MESSAGE_ID_LEN, generate_message_id};
pub use payload_type::PayloadType;
