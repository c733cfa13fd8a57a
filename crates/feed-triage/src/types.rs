use crate::analytics::{AnalyticsSummary, PriceAnalysis};
use crate::reporting::RuleCountReport;
use crate::rules::Classification;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const FIELD_ID: &str = "id";
pub const FIELD_NAME: &str = "name";
pub const FIELD_PRICE: &str = "price";
pub const FIELD_CURRENCY: &str = "currency";
pub const FIELD_CREATED_AT: &str = "created_at";

/// Columns every feed must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 5] = [
    FIELD_ID,
    FIELD_NAME,
    FIELD_PRICE,
    FIELD_CURRENCY,
    FIELD_CREATED_AT,
];

/// One input row: field name to untyped text, in source column order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawRecord {
    fields: Vec<(String, Option<String>)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(field, value)` pairs, keeping their order.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        }
    }

    /// Set a field, replacing an existing value of the same name in place.
    pub fn with(mut self, field: impl Into<String>, value: Option<&str>) -> Self {
        let field = field.into();
        let value = value.map(str::to_string);
        match self.fields.iter_mut().find(|(k, _)| *k == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    /// Value of a field; absent fields and nulls both read as `None`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A row with every field of interest in canonical form or missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub created_at: Option<NaiveDate>,
}

impl NormalizedRecord {
    /// Render back to text so the record can be fed through the normalizer again.
    pub fn to_raw(&self) -> RawRecord {
        RawRecord::from_pairs([
            (FIELD_ID, self.id.clone()),
            (FIELD_NAME, self.name.clone()),
            (FIELD_PRICE, self.price.map(|p| p.to_string())),
            (FIELD_CURRENCY, self.currency.clone()),
            (
                FIELD_CREATED_AT,
                self.created_at.map(|d| d.format("%Y-%m-%d").to_string()),
            ),
        ])
    }
}

/// Final disposition of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Accepted,
    Review,
    Rejected,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Review => "review",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholders for a later human review decision. Never populated here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReviewFields {
    pub decision: Option<String>,
    pub comment: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    /// Position of the record in the input feed.
    pub row: usize,
    pub record: NormalizedRecord,
    pub status: Status,
    /// Comma-joined triggered rule names of the deciding tier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Present only for `review` status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewFields>,
}

/// Counts of each disposition in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DispositionCounts {
    pub input: usize,
    pub accepted: usize,
    pub review: usize,
    pub rejected: usize,
}

/// Everything a triage run produces, before anything is written.
#[derive(Debug, Clone, Serialize)]
pub struct TriageResult {
    /// Normalized records in input order.
    pub normalized: Vec<NormalizedRecord>,
    pub classification: Classification,
    pub rule_counts: RuleCountReport,
    pub summary: AnalyticsSummary,
    pub price_analysis: PriceAnalysis,
    /// Non-fatal conditions raised during the run.
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

impl TriageResult {
    pub fn counts(&self) -> DispositionCounts {
        self.classification.counts()
    }

    pub fn accepted(&self) -> &[ClassifiedRecord] {
        &self.classification.accepted
    }

    pub fn review(&self) -> &[ClassifiedRecord] {
        &self.classification.review
    }

    pub fn rejected(&self) -> &[ClassifiedRecord] {
        &self.classification.rejected
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_raw_record_get_and_order() {
        let raw = RawRecord::from_pairs([
            ("price", Some("1.5")),
            ("id", Some("7")),
            ("name", None),
        ]);

        assert_eq!(raw.get("id"), Some("7"));
        assert_eq!(raw.get("name"), None);
        assert_eq!(raw.get("currency"), None);
        assert_eq!(
            raw.field_names().collect::<Vec<_>>(),
            vec!["price", "id", "name"]
        );
    }

    #[test]
    fn test_raw_record_with_replaces_in_place() {
        let raw = RawRecord::new()
            .with("id", Some("1"))
            .with("price", Some("2"))
            .with("id", None);

        assert_eq!(raw.len(), 2);
        assert_eq!(raw.get("id"), None);
        assert_eq!(raw.field_names().next(), Some("id"));
    }

    #[test]
    fn test_to_raw_renders_canonical_text() {
        let record = NormalizedRecord {
            id: Some("1".to_string()),
            name: Some("Wid Get".to_string()),
            price: Some(19.99),
            currency: Some("USD".to_string()),
            created_at: NaiveDate::from_ymd_opt(2024, 1, 5),
        };

        let raw = record.to_raw();
        assert_eq!(raw.get("price"), Some("19.99"));
        assert_eq!(raw.get("created_at"), Some("2024-01-05"));
        assert_eq!(raw.get("currency"), Some("USD"));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Review).unwrap(), "\"review\"");
        assert_eq!(Status::Rejected.to_string(), "rejected");
    }
}
