//! Timestamp normalization for clinical-document exports.
//!
//! HL7 documents encode instants in the compact `YYYYMMDDHHMMSS[zone]` form
//! (for example `20230615143000-0500`). The flat export uses
//! `YYYY-MM-DD HH:MM:SS zone`, so clinical-document timestamps are rewritten
//! into that layout before records are keyed.

use chrono::NaiveDateTime;

const COMPACT_FORMAT: &str = "%Y%m%d%H%M%S";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const COMPACT_LEN: usize = 14;

/// Rewrites a compact HL7 timestamp as `YYYY-MM-DD HH:MM:SS[ zone]`.
///
/// Anything that does not start with fourteen digits forming a valid
/// calendar instant is returned unchanged.
pub fn format_cda_date(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let Some(base) = raw.get(..COMPACT_LEN) else {
        return raw.to_string();
    };
    let Ok(parsed) = NaiveDateTime::parse_from_str(base, COMPACT_FORMAT) else {
        return raw.to_string();
    };
    let mut formatted = parsed.format(DISPLAY_FORMAT).to_string();
    let zone = &raw[COMPACT_LEN..];
    if !zone.is_empty() {
        formatted.push(' ');
        formatted.push_str(zone);
    }
    formatted
}
