//! The `client` module is the publishing entry point for applications.
//!
//! It provides the `Client` struct, which checks destinations against the
//! configured set, adds scheduling headers and hands envelopes to a
//! `Transport`.

pub mod bus_client;
pub use bus_client::{Client, SCHEDULED_DELIVERY_TIME_MS_HEADER};

#[cfg(test)]
mod tests;
