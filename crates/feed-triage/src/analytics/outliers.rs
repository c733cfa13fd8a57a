//! Price rankings: most expensive records and largest z-score outliers.

use super::statistics;
use crate::error::Result;
use crate::types::ClassifiedRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which ranking a [`PriceAnalysisEntry`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceCategory {
    #[serde(rename = "top_10_expensive")]
    TopExpensive,
    #[serde(rename = "top_10_outliers")]
    TopOutliers,
}

impl PriceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopExpensive => "top_10_expensive",
            Self::TopOutliers => "top_10_outliers",
        }
    }
}

/// One row of the combined price ranking table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAnalysisEntry {
    pub category: PriceCategory,
    pub id: Option<String>,
    pub name: Option<String>,
    pub price: f64,
    /// Only set for the outlier ranking.
    pub z_score: Option<f64>,
}

/// Accepted records that carry a price, in input order.
fn priced(accepted: &[ClassifiedRecord]) -> Vec<(&ClassifiedRecord, f64)> {
    accepted
        .iter()
        .filter_map(|r| r.record.price.map(|p| (r, p)))
        .collect()
}

/// The `n` most expensive records, price descending, ties in input order.
pub(crate) fn top_expensive(accepted: &[ClassifiedRecord], n: usize) -> Vec<PriceAnalysisEntry> {
    let mut candidates = priced(accepted);
    // sort_by is stable, so equal prices keep input order
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

    candidates
        .into_iter()
        .take(n)
        .map(|(r, price)| PriceAnalysisEntry {
            category: PriceCategory::TopExpensive,
            id: r.record.id.clone(),
            name: r.record.name.clone(),
            price,
            z_score: None,
        })
        .collect()
}

/// The `n` records with the largest absolute z-score, ties in input order.
///
/// Propagates the degenerate-distribution condition instead of dividing by zero.
pub(crate) fn top_outliers(
    accepted: &[ClassifiedRecord],
    n: usize,
) -> Result<Vec<PriceAnalysisEntry>> {
    let candidates = priced(accepted);
    let prices: Vec<f64> = candidates.iter().map(|(_, p)| *p).collect();
    let z = statistics::z_scores(&prices)?;

    let mut scored: Vec<_> = candidates.into_iter().zip(z).collect();
    scored.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

    let entries: Vec<PriceAnalysisEntry> = scored
        .into_iter()
        .take(n)
        .map(|((r, price), z)| PriceAnalysisEntry {
            category: PriceCategory::TopOutliers,
            id: r.record.id.clone(),
            name: r.record.name.clone(),
            price,
            z_score: Some(z),
        })
        .collect();

    debug!("Ranked {} price outliers", entries.len());
    Ok(entries)
}
