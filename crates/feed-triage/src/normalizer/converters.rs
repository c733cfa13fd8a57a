//! Typed conversion of price and date fields.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date-only layouts tried after `/` has been rewritten to `-`.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m-%d-%Y"];

/// Datetime layouts whose time of day is discarded.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m-%d-%Y %H:%M:%S",
    "%m-%d-%Y %H:%M",
];

/// Parse a price; anything that is not a finite decimal becomes `None`.
pub(crate) fn parse_price(value: Option<&str>) -> Option<f64> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Parse a calendar date from ISO-like or slash-delimited text.
pub(crate) fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    let candidate = trimmed.replace('/', "-");

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&candidate, format) {
            return Some(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&candidate, format) {
            return Some(dt.date());
        }
    }

    None
}
