//! Tiered classification engine.

use super::{RuleSet, join_reason};
use crate::config::TriageConfig;
use crate::error::{Result, TriageError};
use crate::types::{ClassifiedRecord, DispositionCounts, NormalizedRecord, ReviewFields, Status};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Flags of both tiers for a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub reject: Vec<bool>,
    pub review: Vec<bool>,
}

impl RuleEvaluation {
    pub fn any_reject(&self) -> bool {
        self.reject.iter().any(|hit| *hit)
    }

    pub fn any_review(&self) -> bool {
        self.review.iter().any(|hit| *hit)
    }

    /// Reject tier dominates: review flags only matter when no reject rule fires.
    pub fn status(&self) -> Status {
        if self.any_reject() {
            Status::Rejected
        } else if self.any_review() {
            Status::Review
        } else {
            Status::Accepted
        }
    }
}

/// Per-record rule flags for the whole run, one row per input record.
///
/// Review flags are computed for every record, including rejected ones,
/// so that the rule count report covers the entire input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEvaluationTable {
    pub reject_rules: Vec<String>,
    pub review_rules: Vec<String>,
    pub rows: Vec<RuleEvaluation>,
}

impl RuleEvaluationTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of records for which the `index`-th reject rule held.
    pub fn reject_count(&self, index: usize) -> usize {
        self.rows
            .iter()
            .filter(|row| row.reject.get(index).copied().unwrap_or(false))
            .count()
    }

    /// Number of records for which the `index`-th review rule held.
    pub fn review_count(&self, index: usize) -> usize {
        self.rows
            .iter()
            .filter(|row| row.review.get(index).copied().unwrap_or(false))
            .count()
    }
}

/// The three partitions produced by the engine plus the evaluation table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    pub accepted: Vec<ClassifiedRecord>,
    pub review: Vec<ClassifiedRecord>,
    pub rejected: Vec<ClassifiedRecord>,
    pub evaluations: RuleEvaluationTable,
}

impl Classification {
    pub fn counts(&self) -> DispositionCounts {
        DispositionCounts {
            input: self.evaluations.len(),
            accepted: self.accepted.len(),
            review: self.review.len(),
            rejected: self.rejected.len(),
        }
    }

    /// All classified records back in input order.
    pub fn in_input_order(&self) -> Vec<&ClassifiedRecord> {
        let mut all: Vec<&ClassifiedRecord> = self
            .accepted
            .iter()
            .chain(&self.review)
            .chain(&self.rejected)
            .collect();
        all.sort_by_key(|r| r.row);
        all
    }
}

/// Two-tier rule engine.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    reject: RuleSet,
    review: RuleSet,
}

impl RuleEngine {
    /// Engine with the built-in rule sets, using the configured thresholds.
    pub fn new(config: &TriageConfig) -> Self {
        Self {
            reject: RuleSet::reject_rules(),
            review: RuleSet::review_rules(config.very_high_price_threshold),
        }
    }

    /// Engine with custom rule sets. The two sets must be disjoint by name.
    pub fn with_rule_sets(reject: RuleSet, review: RuleSet) -> Result<Self> {
        let reject_names: HashSet<&str> = reject.rules().iter().map(|r| r.name()).collect();
        if let Some(clash) = review
            .rules()
            .iter()
            .find(|r| reject_names.contains(r.name()))
        {
            return Err(TriageError::InvalidConfig(format!(
                "rule '{}' is declared in both tiers",
                clash.name()
            )));
        }
        Ok(Self { reject, review })
    }

    pub fn reject_rules(&self) -> &RuleSet {
        &self.reject
    }

    pub fn review_rules(&self) -> &RuleSet {
        &self.review
    }

    /// Evaluate both tiers against a record.
    pub fn evaluate(&self, record: &NormalizedRecord) -> RuleEvaluation {
        RuleEvaluation {
            reject: self.reject.evaluate(record),
            review: self.review.evaluate(record),
        }
    }

    /// Reason for a record with the given evaluation, taken from the deciding tier.
    fn reason_for(&self, evaluation: &RuleEvaluation) -> Option<String> {
        match evaluation.status() {
            Status::Rejected => join_reason(&self.reject.names_for_flags(&evaluation.reject)),
            Status::Review => join_reason(&self.review.names_for_flags(&evaluation.review)),
            Status::Accepted => None,
        }
    }

    /// Classify one record located at `row` in the input.
    pub fn classify_record(
        &self,
        row: usize,
        record: NormalizedRecord,
    ) -> (ClassifiedRecord, RuleEvaluation) {
        let evaluation = self.evaluate(&record);
        let status = evaluation.status();
        let classified = ClassifiedRecord {
            row,
            reason: self.reason_for(&evaluation),
            review: (status == Status::Review).then(ReviewFields::default),
            status,
            record,
        };
        (classified, evaluation)
    }

    /// Classify every record, partitioning them while keeping input order.
    pub fn classify(&self, records: Vec<NormalizedRecord>) -> Classification {
        let mut classification = Classification {
            evaluations: RuleEvaluationTable {
                reject_rules: self.reject.names(),
                review_rules: self.review.names(),
                rows: Vec::with_capacity(records.len()),
            },
            ..Default::default()
        };

        for (row, record) in records.into_iter().enumerate() {
            let (classified, evaluation) = self.classify_record(row, record);
            debug!(
                "Row {} -> {} ({})",
                row,
                classified.status,
                classified.reason.as_deref().unwrap_or("-")
            );
            classification.evaluations.rows.push(evaluation);
            match classified.status {
                Status::Accepted => classification.accepted.push(classified),
                Status::Review => classification.review.push(classified),
                Status::Rejected => classification.rejected.push(classified),
            }
        }

        let counts = classification.counts();
        info!(
            "Classified {} records: {} accepted, {} review, {} rejected",
            counts.input, counts.accepted, counts.review, counts.rejected
        );

        classification
    }
}
