//! Microsecond-precision timestamp type
//!
//! Every transaction records the moment it was created, and every idempotency
//! entry records when it was cached. Both use this type.
//!
//! ## Precision
//!
//! Timestamps are stored as microseconds since Unix epoch (1970-01-01 00:00:00 UTC).
//! Pagination orders by `(timestamp, id)`, so two transactions created within
//! the same microsecond still have a deterministic order.
//!
//! ```
//! use tally_core::Timestamp;
//!
//! let now = Timestamp::now();
//! let earlier = Timestamp::from_micros(1_000_000_000);
//! assert!(now > earlier);
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Microsecond-precision timestamp
///
/// Serializes as a plain integer of microseconds. Use [`rfc3339`] to render
/// it as an RFC 3339 string inside JSON bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Maximum representable timestamp
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    /// Create a timestamp for the current moment
    ///
    /// Returns epoch if the system clock is before Unix epoch.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as u64)
    }

    /// Create a timestamp from microseconds since epoch
    #[inline]
    pub const fn from_micros(micros: u64) -> Self {
        Timestamp(micros)
    }

    /// Get microseconds since Unix epoch
    #[inline]
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Compute duration since an earlier timestamp
    ///
    /// Returns `None` if `earlier` is actually later than `self`.
    pub fn duration_since(&self, earlier: Timestamp) -> Option<Duration> {
        if self.0 >= earlier.0 {
            Some(Duration::from_micros(self.0 - earlier.0))
        } else {
            None
        }
    }

    /// Add a duration, saturating at `Timestamp::MAX`
    pub fn saturating_add(&self, duration: Duration) -> Self {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(micros))
    }

    /// Convert to a UTC `DateTime`
    ///
    /// Returns `None` for values beyond chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_micros)
    }

    /// Convert from a UTC `DateTime`
    ///
    /// Instants before the epoch clamp to `Timestamp::EPOCH`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Timestamp(u64::try_from(dt.timestamp_micros()).unwrap_or(0))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::EPOCH
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Micros, true)),
            None => write!(f, "{}us", self.0),
        }
    }
}

/// Serde adapter rendering a [`Timestamp`] as an RFC 3339 string.
///
/// ```ignore
/// #[serde(with = "tally_core::timestamp::rfc3339")]
/// at: Timestamp,
/// ```
pub mod rfc3339 {
    use super::Timestamp;
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize as RFC 3339 with microsecond precision, `Z` suffix.
    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        let dt = ts
            .to_datetime()
            .ok_or_else(|| serde::ser::Error::custom("timestamp out of range"))?;
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    /// Parse any RFC 3339 string and normalize to UTC.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let dt = DateTime::parse_from_rfc3339(&raw).map_err(de::Error::custom)?;
        Ok(Timestamp::from_datetime(dt.with_timezone(&Utc)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_now_advances() {
        let before = Timestamp::now();
        std::thread::sleep(Duration::from_millis(1));
        let after = Timestamp::now();
        assert!(after > before, "Time should advance");
    }

    #[test]
    fn test_timestamp_duration_since() {
        let t1 = Timestamp::from_micros(1000);
        let t2 = Timestamp::from_micros(3000);

        assert_eq!(t2.duration_since(t1).unwrap().as_micros(), 2000);
        assert!(t1.duration_since(t2).is_none());
    }

    #[test]
    fn test_timestamp_saturating_add() {
        assert_eq!(
            Timestamp::MAX.saturating_add(Duration::from_micros(1)),
            Timestamp::MAX
        );
        assert_eq!(
            Timestamp::from_micros(10).saturating_add(Duration::from_micros(5)),
            Timestamp::from_micros(15)
        );
    }

    #[test]
    fn test_timestamp_display_is_rfc3339() {
        let ts = Timestamp::from_micros(1_700_000_000_123_456);
        assert_eq!(ts.to_string(), "2023-11-14T22:13:20.123456Z");
    }

    #[test]
    fn test_timestamp_datetime_roundtrip() {
        let ts = Timestamp::from_micros(1_700_000_000_123_456);
        let dt = ts.to_datetime().unwrap();
        assert_eq!(Timestamp::from_datetime(dt), ts);
    }

    #[test]
    fn test_rfc3339_serde_adapter() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            #[serde(with = "rfc3339")]
            at: Timestamp,
        }

        let w = Wrapper {
            at: Timestamp::from_micros(1_700_000_000_000_001),
        };
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, r#"{"at":"2023-11-14T22:13:20.000001Z"}"#);

        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at, w.at);
    }

    #[test]
    fn test_plain_serde_is_micros() {
        let ts = Timestamp::from_micros(42);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "42");
    }
}
