//! Message id generation.
//!
//! A fresh UUIDv4 is hashed and the first 128 bits of the digest are rendered
//! as lowercase hex, giving fixed-length ids that need no coordination with
//! the broker.
//!
//! The digest is SHA-256 truncated to 16 bytes rather than MD5. It is used
//! only to spread the random seed uniformly, not for any security property,
//! so the observable contract (32 lowercase hex characters, unique with
//! overwhelming probability) is unchanged.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length in characters of every generated id.
pub const MESSAGE_ID_LEN: usize = 32;

/// Generates a new message id.
pub fn generate_message_id() -> String {
    let seed = Uuid::new_v4().to_string();
    salted_id(&seed)
}

pub(super) fn salted_id(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let id = hex::encode(&digest[..MESSAGE_ID_LEN / 2]);
    tracing::trace!(message_id = %id, "generated message id");
    id
}
