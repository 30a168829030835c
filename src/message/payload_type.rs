use std::fmt;

/// The encoding of a message payload.
///
/// Each variant carries a fixed integer discriminant that is written on the
/// wire. Discriminants are never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum PayloadType {
    Json = 1,
    Binary = 2,
    String = 3,
}

impl PayloadType {
    /// Returns the wire discriminant for this payload type.
    pub fn discriminant(self) -> i32 {
        self as i32
    }

    /// Looks up a payload type by its wire discriminant.
    ///
    /// Returns `None` for anything outside the known set so decoders can
    /// decide for themselves how to treat records from newer or older peers.
    pub fn from_discriminant(value: i32) -> Option<Self> {
        match value {
            1 => Some(PayloadType::Json),
            2 => Some(PayloadType::Binary),
            3 => Some(PayloadType::String),
            _ => None,
        }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayloadType::Json => "JSON",
            PayloadType::Binary => "BINARY",
            PayloadType::String => "STRING",
        };
        f.write_str(name)
    }
}
