//! Price analytics over the accepted partition.
//!
//! Produces the [`AnalyticsSummary`] (counts, mean and median price) and the
//! combined [`PriceAnalysis`] ranking table. Both only ever see accepted
//! records.

mod outliers;
mod statistics;

pub use outliers::{PriceAnalysisEntry, PriceCategory};

use crate::config::RoundingMode;
use crate::error::TriageError;
use crate::types::ClassifiedRecord;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Summary statistics of the accepted partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Mean of non-missing prices, rounded to 2 decimals.
    pub avg_price: Option<f64>,
    /// Median of non-missing prices, rounded to 2 decimals.
    pub median_price: Option<f64>,
    pub total_products: usize,
    /// Accepted records without a price. Always 0 while `missing_price`
    /// is a reject rule; a non-zero value means the engine regressed.
    pub missing_price_count: usize,
}

/// Combined ranking table: expensive ranking followed by outlier ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceAnalysis {
    pub top_expensive: Vec<PriceAnalysisEntry>,
    pub top_outliers: Vec<PriceAnalysisEntry>,
    /// Set when the outlier ranking was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degenerate: Option<String>,
}

impl PriceAnalysis {
    /// Both rankings concatenated; a record may appear in each.
    pub fn entries(&self) -> impl Iterator<Item = &PriceAnalysisEntry> {
        self.top_expensive.iter().chain(&self.top_outliers)
    }

    pub fn len(&self) -> usize {
        self.top_expensive.len() + self.top_outliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Analytics stage.
pub struct Analytics;

impl Analytics {
    /// Summarize the accepted partition.
    pub fn summarize(accepted: &[ClassifiedRecord], rounding: RoundingMode) -> AnalyticsSummary {
        let prices: Vec<f64> = accepted.iter().filter_map(|r| r.record.price).collect();
        let missing_price_count = accepted.len() - prices.len();

        if missing_price_count > 0 {
            warn!(
                "{} accepted records have no price; the missing_price rule did not hold",
                missing_price_count
            );
        }

        let summary = AnalyticsSummary {
            avg_price: statistics::mean(&prices).map(|v| rounding.round2(v)),
            median_price: statistics::median(&prices).map(|v| rounding.round2(v)),
            total_products: accepted.len(),
            missing_price_count,
        };

        info!(
            "Analytics summary: {} products, avg {:?}, median {:?}",
            summary.total_products, summary.avg_price, summary.median_price
        );
        summary
    }

    /// Rank the `top_n` most expensive and most outlying accepted records.
    ///
    /// A degenerate price distribution skips the outlier ranking and is
    /// recorded on the result; the expensive ranking is always produced.
    pub fn analyze_prices(accepted: &[ClassifiedRecord], top_n: usize) -> PriceAnalysis {
        let top_expensive = outliers::top_expensive(accepted, top_n);

        let (top_outliers, degenerate) = match outliers::top_outliers(accepted, top_n) {
            Ok(entries) => (entries, None),
            Err(e @ TriageError::DegenerateDistribution { .. }) => {
                warn!("Skipping outlier ranking: {}", e);
                (Vec::new(), Some(e.to_string()))
            }
            Err(e) => {
                warn!("Outlier ranking failed: {}", e);
                (Vec::new(), Some(e.to_string()))
            }
        };

        PriceAnalysis {
            top_expensive,
            top_outliers,
            degenerate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NormalizedRecord, Status};
    use pretty_assertions::assert_eq;

    fn accepted(prices: &[Option<f64>]) -> Vec<ClassifiedRecord> {
        prices
            .iter()
            .enumerate()
            .map(|(row, price)| ClassifiedRecord {
                row,
                record: NormalizedRecord {
                    id: Some(row.to_string()),
                    price: *price,
                    ..Default::default()
                },
                status: Status::Accepted,
                reason: None,
                review: None,
            })
            .collect()
    }

    #[test]
    fn test_summary_mean_and_median() {
        let records = accepted(&[Some(10.0), Some(20.0), Some(40.0)]);
        let summary = Analytics::summarize(&records, RoundingMode::HalfEven);

        assert_eq!(
            summary,
            AnalyticsSummary {
                avg_price: Some(23.33),
                median_price: Some(20.0),
                total_products: 3,
                missing_price_count: 0,
            }
        );
    }

    #[test]
    fn test_summary_rounding_mode_applies() {
        // mean 0.125, median 0.125
        let records = accepted(&[Some(0.0), Some(0.125), Some(0.25)]);

        let even = Analytics::summarize(&records, RoundingMode::HalfEven);
        let away = Analytics::summarize(&records, RoundingMode::HalfAwayFromZero);

        assert_eq!(even.median_price, Some(0.12));
        assert_eq!(away.median_price, Some(0.13));
        assert_eq!(even.avg_price, Some(0.12));
        assert_eq!(away.avg_price, Some(0.13));
    }

    #[test]
    fn test_summary_counts_missing_prices_defensively() {
        let records = accepted(&[Some(1.0), None, Some(3.0)]);
        let summary = Analytics::summarize(&records, RoundingMode::HalfEven);

        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.missing_price_count, 1);
        assert_eq!(summary.avg_price, Some(2.0));
        assert_eq!(summary.median_price, Some(2.0));
    }

    #[test]
    fn test_summary_empty_partition() {
        let summary = Analytics::summarize(&[], RoundingMode::HalfEven);
        assert_eq!(summary.total_products, 0);
        assert_eq!(summary.avg_price, None);
        assert_eq!(summary.median_price, None);
    }

    #[test]
    fn test_analyze_prices_degenerate_keeps_expensive_ranking() {
        let records = accepted(&[Some(10.0), Some(10.0), Some(10.0)]);
        let analysis = Analytics::analyze_prices(&records, 10);

        assert!(analysis.degenerate.is_some());
        assert!(analysis.top_outliers.is_empty());
        assert_eq!(analysis.top_expensive.len(), 3);
        assert_eq!(analysis.len(), 3);
    }

    #[test]
    fn test_analyze_prices_concatenates_without_dedup() {
        let records = accepted(&[Some(1.0), Some(2.0), Some(100.0)]);
        let analysis = Analytics::analyze_prices(&records, 1);

        let entries: Vec<_> = analysis.entries().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].category, PriceCategory::TopExpensive);
        assert_eq!(entries[1].category, PriceCategory::TopOutliers);
        // the same record heads both rankings
        assert_eq!(entries[0].id, entries[1].id);
        assert_eq!(entries[0].z_score, None);
        assert!(entries[1].z_score.is_some());
    }
}
