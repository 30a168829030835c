//! # messagebus
//!
//! `messagebus` provides the message envelope shared by every producer and
//! consumer of the bus, together with the plumbing needed to move it around.
//!
//! ## Core Modules
//!
//! - `message`: the `Message` envelope, its `PayloadType` tags and id generation.
//! - `transport`: the wire record, the `Transport` seam and an in-process loopback transport.
//! - `client`: the publishing facade applications talk to.
//! - `config`: loading client settings from files and the environment.
//! - `utils`: error types and logging setup.

pub mod client;
pub mod config;
pub mod message;
pub mod transport;
pub mod utils;

pub use message::{Message, Payload, PayloadType};
