//! Canonical timestamp handling.
//!
//! Every timestamp is stored with microsecond resolution and rendered in one
//! fixed-width, UTC-qualified form. Because the width never varies, canonical
//! strings sort the same way the instants they name do.

use chrono::{DateTime, NaiveDateTime, SubsecRound, TimeZone, Utc};

use crate::{StoreError, StoreResult};

pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Drops anything finer than a microsecond.
pub fn truncate(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(6)
}

pub fn canonical(timestamp: &DateTime<Utc>) -> String {
    truncate(*timestamp).format(CANONICAL_FORMAT).to_string()
}

pub fn parse(text: &str) -> StoreResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, CANONICAL_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|err| StoreError::Validation(format!("timestamp '{text}': {err}")))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn test_canonical_has_fixed_microsecond_width() {
        let whole_second = Utc.with_ymd_and_hms(2022, 11, 2, 10, 0, 5).unwrap();
        assert_eq!(canonical(&whole_second), "2022-11-02T10:00:05.000000Z");

        let with_nanos = whole_second + Duration::nanoseconds(123_456_789);
        assert_eq!(canonical(&with_nanos), "2022-11-02T10:00:05.123456Z");
    }

    #[test]
    fn test_canonical_strings_sort_like_instants() {
        let earlier = Utc.with_ymd_and_hms(2022, 11, 2, 9, 59, 59).unwrap();
        let later = earlier + Duration::microseconds(1);

        assert!(canonical(&earlier) < canonical(&later));
    }

    #[test]
    fn test_parse_canonical() {
        let timestamp = Utc.with_ymd_and_hms(2022, 11, 2, 10, 0, 10).unwrap()
            + Duration::microseconds(42);

        assert_eq!(parse(&canonical(&timestamp)).unwrap(), timestamp);
        assert!(parse("10:00").is_err());
    }
}
