//! Normalization of store-native timestamp encodings.
//!
//! Documents arrive with timestamps in whatever shape the store uses:
//! native `{seconds, nanoseconds}` objects (also the `_seconds` /
//! `_nanoseconds` export form), epoch milliseconds, or RFC 3339 strings.
//! All of them normalize to `DateTime<Utc>`. Values that cannot be
//! normalized fall back to [`EPOCH`] so a single bad record never fails a
//! whole snapshot.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Sentinel substituted for absent or malformed timestamps.
pub const EPOCH: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Outcome of normalizing one timestamp field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalized {
    /// The field held a usable timestamp.
    Valid(DateTime<Utc>),
    /// The field was absent or null.
    Missing,
    /// The field was present but could not be interpreted.
    Malformed,
}

impl Normalized {
    /// The normalized time, or the epoch sentinel.
    pub fn or_epoch(self) -> DateTime<Utc> {
        match self {
            Self::Valid(ts) => ts,
            Self::Missing | Self::Malformed => EPOCH,
        }
    }
}

/// Normalize an optional store timestamp field.
pub fn normalize(value: Option<&Value>) -> Normalized {
    match value {
        None | Some(Value::Null) => Normalized::Missing,
        Some(v) => parse(v).map_or(Normalized::Malformed, Normalized::Valid),
    }
}

/// Parse a single store-native timestamp value.
pub fn parse(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(map) => {
            let seconds = map.get("seconds").or_else(|| map.get("_seconds"))?.as_i64()?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).ok()?;
            DateTime::from_timestamp(seconds, nanos)
        }
        Value::Number(n) => {
            if let Some(millis) = n.as_i64() {
                DateTime::from_timestamp_millis(millis)
            } else {
                let millis = n.as_f64().filter(|m| m.is_finite())?;
                DateTime::from_timestamp_millis(millis.trunc() as i64)
            }
        }
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        _ => None,
    }
}

/// Encode a time in the store's native `{seconds, nanoseconds}` form.
pub fn to_native(ts: DateTime<Utc>) -> Value {
    serde_json::json!({
        "seconds": ts.timestamp(),
        "nanoseconds": ts.timestamp_subsec_nanos(),
    })
}
