//! Local checks shared by several validators. All pure.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::model::types::{is_blank, is_populated};
use crate::model::Reference;
use crate::response::ValidatorResponse;

pub fn not_empty(location: &str) -> ValidatorResponse {
    ValidatorResponse::invalid(format!("{} SHALL NOT be empty", location))
}

/// Reference present with a non-empty target id
pub fn reference_populated(reference: Option<&Reference>, location: &str) -> ValidatorResponse {
    if is_populated(reference) {
        ValidatorResponse::valid()
    } else {
        not_empty(location)
    }
}

/// Timestamp present and parseable. A parse failure is reported with the
/// raw value.
pub fn authored_on(raw: Option<&str>, location: &str) -> ValidatorResponse {
    let Some(raw) = raw.filter(|r| !is_blank(Some(*r))) else {
        return not_empty(location);
    };

    match parse_date_time(raw) {
        Some(_) => ValidatorResponse::valid(),
        None => ValidatorResponse::invalid(format!(
            "{} was found to be an invalid format: {}",
            location, raw
        )),
    }
}

/// Parse a date-time in any of the accepted forms: RFC 3339, a date-time
/// without offset, or a partial date (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`).
/// Offsets are normalised to UTC.
pub fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    let padded = match raw.len() {
        4 if raw.bytes().all(|b| b.is_ascii_digit()) => format!("{}-01-01", raw),
        7 => format!("{}-01", raw),
        _ => raw.to_string(),
    };
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
