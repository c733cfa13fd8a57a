//! Tabular input and output.
//!
//! The feed is read with polars into [`RawRecord`](crate::types::RawRecord)s.
//! On the way out, a [`TriageResult`] is rendered into six DataFrames
//! ([`OutputTables`]) that are handed to a [`TableSink`] in one piece.

mod sink;
mod source;

pub use sink::{CsvDirectorySink, MemorySink, TableSink};
pub use source::{read_raw_records, records_from_dataframe};

use crate::error::{Result, ResultExt};
use crate::types::{ClassifiedRecord, ReviewFields, TriageResult};
use polars::prelude::*;

/// The full set of tables a run produces.
#[derive(Debug, Clone)]
pub struct OutputTables {
    pub analytics_summary: DataFrame,
    pub price_analysis: DataFrame,
    pub rejected_products: DataFrame,
    pub review_products: DataFrame,
    pub rule_counts: DataFrame,
    pub accepted_products: DataFrame,
}

/// Which trailing columns a record table carries.
#[derive(Clone, Copy, PartialEq, Eq)]
enum RecordColumns {
    Status,
    Reason,
    ReviewPlaceholders,
}

impl OutputTables {
    pub const NAMES: [&'static str; 6] = [
        "analytics_summary",
        "price_analysis",
        "rejected_products",
        "review_products",
        "rule_counts",
        "accepted_products",
    ];

    /// Render every table from a run result.
    pub fn from_result(result: &TriageResult) -> Result<Self> {
        Ok(Self {
            analytics_summary: summary_frame(result).context("Building analytics_summary")?,
            price_analysis: price_analysis_frame(result).context("Building price_analysis")?,
            rejected_products: record_frame(result.rejected(), RecordColumns::Reason)
                .context("Building rejected_products")?,
            review_products: record_frame(result.review(), RecordColumns::ReviewPlaceholders)
                .context("Building review_products")?,
            rule_counts: rule_counts_frame(result).context("Building rule_counts")?,
            accepted_products: record_frame(result.accepted(), RecordColumns::Status)
                .context("Building accepted_products")?,
        })
    }

    /// Tables paired with their names, in [`Self::NAMES`] order.
    pub fn iter(&self) -> [(&'static str, &DataFrame); 6] {
        [
            (Self::NAMES[0], &self.analytics_summary),
            (Self::NAMES[1], &self.price_analysis),
            (Self::NAMES[2], &self.rejected_products),
            (Self::NAMES[3], &self.review_products),
            (Self::NAMES[4], &self.rule_counts),
            (Self::NAMES[5], &self.accepted_products),
        ]
    }

    pub fn get(&self, name: &str) -> Option<&DataFrame> {
        self.iter()
            .into_iter()
            .find(|(table, _)| *table == name)
            .map(|(_, df)| df)
    }
}

fn summary_frame(result: &TriageResult) -> PolarsResult<DataFrame> {
    let summary = &result.summary;
    DataFrame::new(vec![
        Series::new("avg_price".into(), &[summary.avg_price]).into(),
        Series::new("median_price".into(), &[summary.median_price]).into(),
        Series::new("total_products".into(), &[summary.total_products as u64]).into(),
        Series::new(
            "missing_price_count".into(),
            &[summary.missing_price_count as u64],
        )
        .into(),
    ])
}

fn price_analysis_frame(result: &TriageResult) -> PolarsResult<DataFrame> {
    let entries: Vec<_> = result.price_analysis.entries().collect();

    let ids: Vec<Option<&str>> = entries.iter().map(|e| e.id.as_deref()).collect();
    let names: Vec<Option<&str>> = entries.iter().map(|e| e.name.as_deref()).collect();
    let prices: Vec<f64> = entries.iter().map(|e| e.price).collect();
    let categories: Vec<&str> = entries.iter().map(|e| e.category.as_str()).collect();
    let z_scores: Vec<Option<f64>> = entries.iter().map(|e| e.z_score).collect();

    DataFrame::new(vec![
        Series::new("id".into(), ids).into(),
        Series::new("name".into(), names).into(),
        Series::new("price".into(), prices).into(),
        Series::new("category".into(), categories).into(),
        Series::new("z_score".into(), z_scores).into(),
    ])
}

fn record_frame(records: &[ClassifiedRecord], extra: RecordColumns) -> PolarsResult<DataFrame> {
    let ids: Vec<Option<&str>> = records.iter().map(|r| r.record.id.as_deref()).collect();
    let names: Vec<Option<&str>> = records.iter().map(|r| r.record.name.as_deref()).collect();
    let prices: Vec<Option<f64>> = records.iter().map(|r| r.record.price).collect();
    let currencies: Vec<Option<&str>> = records
        .iter()
        .map(|r| r.record.currency.as_deref())
        .collect();
    let dates: Vec<Option<String>> = records
        .iter()
        .map(|r| r.record.created_at.map(|d| d.format("%Y-%m-%d").to_string()))
        .collect();
    let statuses: Vec<&str> = records.iter().map(|r| r.status.as_str()).collect();

    let mut columns: Vec<Column> = vec![
        Series::new("id".into(), ids).into(),
        Series::new("name".into(), names).into(),
        Series::new("price".into(), prices).into(),
        Series::new("currency".into(), currencies).into(),
        Series::new("created_at".into(), dates).into(),
        Series::new("status".into(), statuses).into(),
    ];

    if extra != RecordColumns::Status {
        let reasons: Vec<Option<&str>> = records.iter().map(|r| r.reason.as_deref()).collect();
        columns.push(Series::new("reason".into(), reasons).into());
    }

    if extra == RecordColumns::ReviewPlaceholders {
        columns.push(
            Series::new("decision".into(), review_column(records, |f| f.decision.as_deref())).into(),
        );
        columns.push(
            Series::new("comment".into(), review_column(records, |f| f.comment.as_deref())).into(),
        );
        columns.push(
            Series::new("reviewed_by".into(), review_column(records, |f| f.reviewed_by.as_deref()))
                .into(),
        );
        columns.push(
            Series::new("reviewed_at".into(), review_column(records, |f| f.reviewed_at.as_deref()))
                .into(),
        );
    }

    DataFrame::new(columns)
}

fn review_column<'a>(
    records: &'a [ClassifiedRecord],
    field: fn(&'a ReviewFields) -> Option<&'a str>,
) -> Vec<Option<&'a str>> {
    records
        .iter()
        .map(|r| r.review.as_ref().and_then(field))
        .collect()
}

fn rule_counts_frame(result: &TriageResult) -> PolarsResult<DataFrame> {
    let rows = &result.rule_counts.rows;
    let rules: Vec<&str> = rows.iter().map(|r| r.rule.as_str()).collect();
    let rejects: Vec<u64> = rows.iter().map(|r| r.reject_count as u64).collect();
    let reviews: Vec<u64> = rows.iter().map(|r| r.review_flag_count as u64).collect();

    DataFrame::new(vec![
        Series::new("rule".into(), rules).into(),
        Series::new("reject_count".into(), rejects).into(),
        Series::new("review_flag_count".into(), reviews).into(),
    ])
}
