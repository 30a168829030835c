//! Serde helpers that pin date-valued fields of JSON payloads to the
//! `yyyy-MM-ddTHH:mm:ssZ` layout shared by every bus client.
//!
//! ```rust
//! use chrono::{DateTime, Utc};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct OrderPlaced {
//!     order_id: u64,
//!     #[serde(with = "messagebus::message::json_date")]
//!     placed_at: DateTime<Utc>,
//! }
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// `chrono` format string for dates inside JSON payloads.
pub const JSON_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&date.format(JSON_DATE_FORMAT))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&text, JSON_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

/// Same layout for optional date fields.
pub mod option {
    use super::*;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => super::serialize(date, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|text| {
                NaiveDateTime::parse_from_str(&text, JSON_DATE_FORMAT)
                    .map(|naive| naive.and_utc())
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}
