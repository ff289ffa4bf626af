//! # Temporal Types — Audit Timestamps
//!
//! Defines [`Timestamp`], the single timestamp type behind every audit
//! column in the stack (`created_at`, `updated_at`, `scan_at`, ledger
//! `recorded_at`).
//!
//! ## Invariant
//!
//! All timestamps are UTC with a `Z` suffix, truncated to seconds. Depot
//! sites span timezones; storing local offsets would make scan ordering and
//! ledger digests depend on which terminal wrote the row.
//!
//! Seconds precision is also why `(scan_by, scan_at)` is not a reliable
//! per-scan key: a fast operator can attach two assets within one second.
//! That is what [`ScanId`](crate::ScanId) exists for.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A UTC timestamp with seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`] — the current wall clock, truncated.
/// - [`Timestamp::from_utc()`] — wraps a `DateTime<Utc>`, dropping sub-seconds.
/// - [`Timestamp::parse()`] — RFC 3339 input, `Z` suffix required.
/// - [`Timestamp::parse_lenient()`] — RFC 3339 input, any offset, converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current wall-clock time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Wrap a `chrono::DateTime<Utc>`, dropping any sub-second component.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Parse a timestamp from an RFC 3339 string.
    ///
    /// **Rejects non-UTC inputs.** Only the `Z` suffix is accepted; explicit
    /// offsets like `+00:00` or `+05:30` are rejected even when semantically
    /// UTC. Rows written through this path render back byte-identically.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the string is not
    /// valid RFC 3339 or uses a non-Z offset.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !s.ends_with('Z') {
            return Err(ValidationError::InvalidTimestamp(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }

        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            ValidationError::InvalidTimestamp(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;

        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Parse an RFC 3339 string with any timezone offset, converting the
    /// result to UTC.
    ///
    /// Lenient parser for hydrating rows written by older backends. The
    /// result is always UTC with seconds precision.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the string is not
    /// valid RFC 3339.
    pub fn parse_lenient(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            ValidationError::InvalidTimestamp(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Build a timestamp from Unix epoch seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if `secs` is outside
    /// chrono's representable range.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, ValidationError> {
        let dt = DateTime::from_timestamp(secs, 0).ok_or_else(|| {
            ValidationError::InvalidTimestamp(format!("invalid Unix timestamp: {secs}"))
        })?;
        Ok(Self(dt))
    }

    /// The inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as RFC 3339 with Z suffix (e.g., `2025-08-25T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// The six-digit compact date (`YYMMDD`) used in reference codes.
    ///
    /// `2025-08-25T09:30:00Z` becomes `250825`.
    pub fn compact_date(&self) -> String {
        self.0.format("%y%m%d").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

/// Drop the sub-second component of a `DateTime<Utc>`.
fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn now_has_no_subseconds() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond(), 0);
    }

    #[test]
    fn from_utc_truncates() {
        let dt = Utc.with_ymd_and_hms(2025, 8, 25, 12, 30, 45).unwrap();
        let with_nanos = dt.with_nanosecond(250_000_000).unwrap();
        let ts = Timestamp::from_utc(with_nanos);
        assert_eq!(ts.as_datetime().nanosecond(), 0);
        assert_eq!(ts.to_iso8601(), "2025-08-25T12:30:45Z");
    }

    #[test]
    fn display_matches_iso8601() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 31, 8, 15, 0).unwrap();
        let ts = Timestamp::from_utc(dt);
        assert_eq!(format!("{ts}"), ts.to_iso8601());
    }

    // ---- strict parsing ----

    #[test]
    fn parse_z_suffix_accepted() {
        let ts = Timestamp::parse("2025-08-25T12:00:00Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2025-08-25T12:00:00Z");
    }

    #[test]
    fn parse_plus_zero_rejected() {
        assert!(Timestamp::parse("2025-08-25T12:00:00+00:00").is_err());
    }

    #[test]
    fn parse_offset_rejected() {
        assert!(Timestamp::parse("2025-08-25T17:00:00+05:00").is_err());
        assert!(Timestamp::parse("2025-08-25T08:00:00-04:00").is_err());
    }

    #[test]
    fn parse_subseconds_truncated() {
        let ts = Timestamp::parse("2025-08-25T12:00:00.123456Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2025-08-25T12:00:00Z");
    }

    #[test]
    fn parse_invalid_format() {
        assert!(Timestamp::parse("not-a-date").is_err());
        assert!(Timestamp::parse("2025-08-25").is_err());
        assert!(Timestamp::parse("").is_err());
    }

    // ---- lenient parsing ----

    #[test]
    fn parse_lenient_converts_offset() {
        let ts = Timestamp::parse_lenient("2025-08-25T17:00:00+05:00").unwrap();
        assert_eq!(ts.to_iso8601(), "2025-08-25T12:00:00Z");
    }

    // ---- epoch conversion ----

    #[test]
    fn epoch_roundtrip() {
        let ts = Timestamp::parse("2025-08-25T12:00:00Z").unwrap();
        let ts2 = Timestamp::from_epoch_secs(ts.epoch_secs()).unwrap();
        assert_eq!(ts, ts2);
    }

    // ---- comparison ----

    #[test]
    fn ordering() {
        let earlier = Timestamp::parse("2025-08-25T12:00:00Z").unwrap();
        let later = Timestamp::parse("2025-08-25T12:00:01Z").unwrap();
        assert!(earlier < later);
    }

    // ---- compact date ----

    #[test]
    fn compact_date_format() {
        let ts = Timestamp::parse("2025-08-25T09:30:00Z").unwrap();
        assert_eq!(ts.compact_date(), "250825");
    }

    #[test]
    fn compact_date_pads_single_digits() {
        let ts = Timestamp::parse("2026-01-05T00:00:00Z").unwrap();
        assert_eq!(ts.compact_date(), "260105");
    }

    // ---- serde round trip ----

    #[test]
    fn serde_roundtrip() {
        let ts = Timestamp::parse("2025-08-25T12:00:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, parsed);
    }
}
