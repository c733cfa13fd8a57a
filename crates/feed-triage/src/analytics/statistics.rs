//! Descriptive statistics over price values.

use crate::error::{Result, TriageError};

/// Arithmetic mean, or `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median (average of the two middle values for even lengths).
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}

/// z-score of every value against the sample mean and standard deviation.
///
/// Fails with [`TriageError::DegenerateDistribution`] when fewer than two
/// values are given, the prices do not vary, or the deviation is not finite.
pub(crate) fn z_scores(values: &[f64]) -> Result<Vec<f64>> {
    let degenerate = |reason: &str| TriageError::DegenerateDistribution {
        observations: values.len(),
        reason: reason.to_string(),
    };

    let mean = mean(values).ok_or_else(|| degenerate("no prices to analyze"))?;
    let std = sample_std(values, mean)
        .ok_or_else(|| degenerate("at least two prices are needed for a sample deviation"))?;

    if values.iter().all(|v| *v == values[0]) {
        return Err(degenerate("prices have zero variance"));
    }
    if !mean.is_finite() || !std.is_finite() {
        return Err(degenerate("price deviation overflows a finite value"));
    }
    // Equal prices can still leave a rounding residue in the deviation.
    if std <= f64::EPSILON * mean.abs().max(1.0) {
        return Err(degenerate("prices have zero variance"));
    }

    Ok(values.iter().map(|v| (v - mean) / std).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[7.0]), Some(7.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_sample_std_uses_n_minus_one() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = sample_std(&values, 5.0).unwrap();
        // population std is 2.0; sample std is sqrt(32 / 7)
        assert!((std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0], 1.0), None);
    }

    #[test]
    fn test_z_scores() {
        let z = z_scores(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(z, vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_z_scores_zero_variance_is_degenerate() {
        let err = z_scores(&[10.0, 10.0, 10.0]).unwrap_err();
        assert!(err.is_degenerate());
        assert!(matches!(
            err,
            TriageError::DegenerateDistribution { observations: 3, .. }
        ));
    }

    #[test]
    fn test_z_scores_inexact_constant_prices_are_degenerate() {
        for price in [0.1, 0.7, 19.99] {
            let err = z_scores(&[price, price, price]).unwrap_err();
            match err {
                TriageError::DegenerateDistribution { reason, .. } => {
                    assert_eq!(reason, "prices have zero variance");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_z_scores_overflowing_prices_are_degenerate() {
        let err = z_scores(&[f64::MAX, -f64::MAX, f64::MAX]).unwrap_err();
        match err {
            TriageError::DegenerateDistribution { reason, .. } => {
                assert_eq!(reason, "price deviation overflows a finite value");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_z_scores_single_or_empty_is_degenerate() {
        assert!(z_scores(&[42.0]).unwrap_err().is_degenerate());
        assert!(z_scores(&[]).unwrap_err().is_degenerate());
    }
}
