//! Timestamp utilities
//!
//! Upstream feeds are inconsistent about timestamp shape: the observation
//! feed sends `2024-03-10 08:15`, the event feed sends RFC 3339 with an
//! offset or a bare date. Everything is normalized to the wall-clock time
//! of the source (`NaiveDateTime`) so calendar days never shift.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Output format used when timestamps are serialized back out
pub const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a feed timestamp into source wall-clock time
///
/// Accepts RFC 3339 (offset preserved as local wall clock), the naive
/// formats above, or a bare `YYYY-MM-DD` date (midnight).
pub fn parse_feed_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Serde adapter for required feed timestamps
pub mod feed_timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(super::OUTPUT_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_feed_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: {:?}", raw)))
    }

    /// Optional variant: missing, null and empty strings all map to `None`
    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_str(&dt.format(super::super::OUTPUT_FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            match raw {
                None => Ok(None),
                Some(s) if s.trim().is_empty() => Ok(None),
                Some(s) => super::super::parse_feed_timestamp(&s)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: {:?}", s))),
            }
        }
    }
}
