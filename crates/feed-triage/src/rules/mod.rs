//! Tiered rule definitions.
//!
//! A [`Rule`] is a named predicate over a [`NormalizedRecord`]. Rules are
//! grouped into two ordered [`RuleSet`]s: the reject tier and the review
//! tier. Declaration order within a set fixes the order of rule names in
//! reason strings and in the rule count report.

mod engine;

pub use engine::{Classification, RuleEngine, RuleEvaluation, RuleEvaluationTable};

use crate::error::{Result, TriageError};
use crate::types::NormalizedRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub const MISSING_ID: &str = "missing_id";
pub const MISSING_CREATED_AT: &str = "missing_created_at";
pub const MISSING_CURRENCY: &str = "missing_currency";
pub const MISSING_PRICE: &str = "missing_price";
pub const NEGATIVE_PRICE: &str = "negative_price";

pub const MISSING_NAME: &str = "missing_name";
pub const PRICE_IS_ZERO: &str = "price_is_zero";
pub const VERY_HIGH_PRICE: &str = "very_high_price";

/// Separator between rule names in a reason string.
pub const REASON_SEPARATOR: &str = ",";

/// Which tier a rule set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTier {
    Reject,
    Review,
}

type Predicate = Arc<dyn Fn(&NormalizedRecord) -> bool + Send + Sync>;

/// A named boolean predicate over a normalized record.
#[derive(Clone)]
pub struct Rule {
    name: String,
    predicate: Predicate,
}

impl Rule {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&NormalizedRecord) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, record: &NormalizedRecord) -> bool {
        (self.predicate)(record)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// An ordered set of rules belonging to one tier.
#[derive(Debug, Clone)]
pub struct RuleSet {
    tier: RuleTier,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a rule set. Rule names must be unique within the set.
    pub fn new(tier: RuleTier, rules: Vec<Rule>) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.name()) {
                return Err(TriageError::InvalidConfig(format!(
                    "duplicate {:?} rule '{}'",
                    tier,
                    rule.name()
                )));
            }
        }
        Ok(Self { tier, rules })
    }

    /// Built-in reject tier, in declaration order.
    pub fn reject_rules() -> Self {
        Self {
            tier: RuleTier::Reject,
            rules: vec![
                Rule::new(MISSING_ID, |r| is_blank(r.id.as_deref())),
                Rule::new(MISSING_CREATED_AT, |r| r.created_at.is_none()),
                Rule::new(MISSING_CURRENCY, |r| is_blank(r.currency.as_deref())),
                Rule::new(MISSING_PRICE, |r| r.price.is_none()),
                Rule::new(NEGATIVE_PRICE, |r| r.price.is_some_and(|p| p < 0.0)),
            ],
        }
    }

    /// Built-in review tier, in declaration order.
    ///
    /// `very_high_price` fires for prices strictly above `very_high_threshold`.
    pub fn review_rules(very_high_threshold: f64) -> Self {
        Self {
            tier: RuleTier::Review,
            rules: vec![
                Rule::new(MISSING_NAME, |r| is_blank(r.name.as_deref())),
                Rule::new(PRICE_IS_ZERO, |r| r.price.is_some_and(|p| p == 0.0)),
                Rule::new(VERY_HIGH_PRICE, move |r| {
                    r.price.is_some_and(|p| p > very_high_threshold)
                }),
            ],
        }
    }

    pub fn tier(&self) -> RuleTier {
        self.tier
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.name().to_string()).collect()
    }

    /// Evaluate every rule, one flag per rule in declaration order.
    pub fn evaluate(&self, record: &NormalizedRecord) -> Vec<bool> {
        self.rules.iter().map(|rule| rule.evaluate(record)).collect()
    }

    /// Names of the rules that hold for `record`, in declaration order.
    pub fn triggered(&self, record: &NormalizedRecord) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|rule| rule.evaluate(record))
            .map(Rule::name)
            .collect()
    }

    /// Names whose flag is set in a previously evaluated row.
    pub(crate) fn names_for_flags(&self, flags: &[bool]) -> Vec<&str> {
        self.rules
            .iter()
            .zip(flags)
            .filter(|(_, hit)| **hit)
            .map(|(rule, _)| rule.name())
            .collect()
    }
}

/// Reason string for `record` against `rules`, or `None` when nothing fires.
pub fn derive_reason(record: &NormalizedRecord, rules: &RuleSet) -> Option<String> {
    join_reason(&rules.triggered(record))
}

pub(crate) fn join_reason(names: &[&str]) -> Option<String> {
    if names.is_empty() {
        None
    } else {
        Some(names.join(REASON_SEPARATOR))
    }
}
