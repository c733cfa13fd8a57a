//! Field normalization for raw feed records.
//!
//! This module converts untyped feed values into their canonical form:
//! - `price`: trimmed and parsed as a decimal number
//! - `name`: whitespace-collapsed and title-cased
//! - `currency`: trimmed and uppercased
//! - `created_at`: ISO-like or slash-delimited text parsed to a calendar date
//!
//! Unparsable values become missing. Normalization never fails a row or a run.

mod converters;
mod sanitizers;

use crate::types::{
    FIELD_CREATED_AT, FIELD_CURRENCY, FIELD_ID, FIELD_NAME, FIELD_PRICE, NormalizedRecord,
    RawRecord,
};
use tracing::debug;

/// Stateless normalizer for raw feed records.
pub struct Normalizer;

impl Normalizer {
    /// Normalize a single record.
    pub fn normalize_record(raw: &RawRecord) -> NormalizedRecord {
        NormalizedRecord {
            id: raw.get(FIELD_ID).map(str::to_string),
            name: sanitizers::sanitize_name(raw.get(FIELD_NAME)),
            price: converters::parse_price(raw.get(FIELD_PRICE)),
            currency: sanitizers::sanitize_currency(raw.get(FIELD_CURRENCY)),
            created_at: converters::parse_date(raw.get(FIELD_CREATED_AT)),
        }
    }

    /// Normalize every record, preserving input order.
    pub fn normalize(records: &[RawRecord]) -> Vec<NormalizedRecord> {
        let normalized: Vec<NormalizedRecord> =
            records.iter().map(Self::normalize_record).collect();

        let unparsable_prices = records
            .iter()
            .zip(&normalized)
            .filter(|(raw, norm)| raw.get(FIELD_PRICE).is_some() && norm.price.is_none())
            .count();
        let unparsable_dates = records
            .iter()
            .zip(&normalized)
            .filter(|(raw, norm)| raw.get(FIELD_CREATED_AT).is_some() && norm.created_at.is_none())
            .count();

        debug!(
            "Normalized {} records ({} unparsable prices, {} unparsable dates)",
            normalized.len(),
            unparsable_prices,
            unparsable_dates
        );

        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn raw(
        id: Option<&str>,
        name: Option<&str>,
        price: Option<&str>,
        currency: Option<&str>,
        created_at: Option<&str>,
    ) -> RawRecord {
        RawRecord::from_pairs([
            ("id", id),
            ("name", name),
            ("price", price),
            ("currency", currency),
            ("created_at", created_at),
        ])
    }

    #[test]
    fn test_normalize_record_canonical_form() {
        let record = Normalizer::normalize_record(&raw(
            Some("1"),
            Some("  wid get  "),
            Some("19.99"),
            Some(" usd "),
            Some("2024-01-05"),
        ));

        assert_eq!(
            record,
            NormalizedRecord {
                id: Some("1".to_string()),
                name: Some("Wid Get".to_string()),
                price: Some(19.99),
                currency: Some("USD".to_string()),
                created_at: NaiveDate::from_ymd_opt(2024, 1, 5),
            }
        );
    }

    #[test]
    fn test_normalize_record_degrades_to_missing() {
        let record = Normalizer::normalize_record(&raw(
            None,
            Some("   "),
            Some("twelve"),
            None,
            Some("yesterday"),
        ));

        assert_eq!(record, NormalizedRecord::default());
    }

    #[test]
    fn test_normalize_ignores_field_order_and_extra_fields() {
        let record = Normalizer::normalize_record(&RawRecord::from_pairs([
            ("created_at", Some("2023/12/31")),
            ("sku", Some("X-1")),
            ("price", Some(" 5 ")),
            ("id", Some("9")),
        ]));

        assert_eq!(record.id.as_deref(), Some("9"));
        assert_eq!(record.price, Some(5.0));
        assert_eq!(record.created_at, NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(record.name, None);
        assert_eq!(record.currency, None);
    }

    #[test]
    fn test_normalize_preserves_order_and_length() {
        let records = vec![
            raw(Some("a"), None, Some("1"), None, None),
            raw(Some("b"), None, Some("2"), None, None),
            raw(Some("c"), None, Some("x"), None, None),
        ];

        let normalized = Normalizer::normalize(&records);
        assert_eq!(normalized.len(), 3);
        let ids: Vec<_> = normalized.iter().map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, vec![Some("a"), Some("b"), Some("c")]);
        assert_eq!(normalized[2].price, None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let records = vec![
            raw(Some("1"), Some("  wid   GET "), Some(" 19.99"), Some("usd"), Some("2024/01/05")),
            raw(Some(" 2 "), Some("x"), Some("-0.5"), Some(" eur "), Some("2024-03-01T10:00:00")),
            raw(None, None, Some("abc"), None, Some("garbage")),
            raw(Some("4"), Some("big one"), Some("45000"), Some("gbp"), Some("02/29/2024")),
        ];

        let once = Normalizer::normalize(&records);
        let rendered: Vec<RawRecord> = once.iter().map(NormalizedRecord::to_raw).collect();
        let twice = Normalizer::normalize(&rendered);

        assert_eq!(once, twice);
    }
}
