//! `ADD_DATE` attribute decoding
//!
//! Netscape bookmark exports store creation time as unix seconds. Only a
//! string of exactly ten ASCII digits is accepted; anything else decodes to
//! [`FALLBACK_CREATED_AT`].

use chrono::{DateTime, Utc};

/// Creation time used when `ADD_DATE` is missing or invalid (the unix epoch)
pub const FALLBACK_CREATED_AT: DateTime<Utc> = DateTime::UNIX_EPOCH;

/// Decode a raw `ADD_DATE` value
pub fn decode_add_date(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(parse_seconds)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or(FALLBACK_CREATED_AT)
}

fn parse_seconds(raw: &str) -> Option<i64> {
    if raw.len() != 10 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
