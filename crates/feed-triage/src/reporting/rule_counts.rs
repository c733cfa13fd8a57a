//! Aggregate rule trigger counts.

use crate::rules::RuleEvaluationTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Trigger counts of a single rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCountRow {
    pub rule: String,
    pub reject_count: usize,
    pub review_flag_count: usize,
}

/// Per-rule trigger counts, most frequent first.
///
/// Rows are ordered by `reject_count` descending, then `review_flag_count`
/// descending; exact ties keep declaration order (reject rules first).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCountReport {
    pub rows: Vec<RuleCountRow>,
}

impl RuleCountReport {
    /// Build the report from the full evaluation table.
    ///
    /// Counts cover every record regardless of its final disposition.
    pub fn from_evaluations(table: &RuleEvaluationTable) -> Self {
        let reject_rows = table
            .reject_rules
            .iter()
            .enumerate()
            .map(|(i, rule)| RuleCountRow {
                rule: rule.clone(),
                reject_count: table.reject_count(i),
                review_flag_count: 0,
            });
        let review_rows = table
            .review_rules
            .iter()
            .enumerate()
            .map(|(i, rule)| RuleCountRow {
                rule: rule.clone(),
                reject_count: 0,
                review_flag_count: table.review_count(i),
            });

        let mut rows: Vec<RuleCountRow> = reject_rows.chain(review_rows).collect();
        // stable sort keeps declaration order on ties
        rows.sort_by(|a, b| {
            b.reject_count
                .cmp(&a.reject_count)
                .then(b.review_flag_count.cmp(&a.review_flag_count))
        });

        debug!("Rule count report built with {} rules", rows.len());
        Self { rows }
    }

    pub fn get(&self, rule: &str) -> Option<&RuleCountRow> {
        self.rows.iter().find(|row| row.rule == rule)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
