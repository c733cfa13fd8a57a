//! Configuration types for the triage pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default price above which a record is flagged for review.
pub const DEFAULT_VERY_HIGH_PRICE: f64 = 30_000.0;

/// Default length of each price ranking list.
pub const DEFAULT_TOP_N: usize = 10;

/// Default field delimiter of the raw product feed.
pub const DEFAULT_SEPARATOR: u8 = b';';

/// Rounding mode used for the 2-decimal analytics figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RoundingMode {
    /// Banker's rounding: ties go to the even neighbour (2.125 -> 2.12)
    #[default]
    HalfEven,
    /// Ties go away from zero (2.125 -> 2.13)
    HalfAwayFromZero,
}

impl RoundingMode {
    /// Round `value` to two decimal places.
    pub fn round2(self, value: f64) -> f64 {
        let scaled = value * 100.0;
        let rounded = match self {
            Self::HalfEven => scaled.round_ties_even(),
            Self::HalfAwayFromZero => scaled.round(),
        };
        rounded / 100.0
    }
}

/// Configuration for the triage pipeline.
///
/// Use [`TriageConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use feed_triage::config::{RoundingMode, TriageConfig};
///
/// let config = TriageConfig::builder()
///     .very_high_price_threshold(50_000.0)
///     .rounding(RoundingMode::HalfAwayFromZero)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Prices strictly above this value trigger the `very_high_price` review rule.
    /// Default: 30000
    pub very_high_price_threshold: f64,

    /// Number of entries in each price ranking list.
    /// Default: 10
    pub top_n: usize,

    /// Rounding mode for `avg_price` and `median_price`.
    /// Default: HalfEven
    pub rounding: RoundingMode,

    /// Field delimiter used to read the feed and write output tables.
    /// Default: b';'
    pub separator: u8,

    /// Output directory for tables and the run report.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Whether to write output tables to disk.
    /// When false, tables are kept in memory only.
    /// Default: true
    pub save_to_disk: bool,

    /// Whether to write `triage_report.json` next to the tables.
    /// Default: false
    pub emit_report: bool,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            very_high_price_threshold: DEFAULT_VERY_HIGH_PRICE,
            top_n: DEFAULT_TOP_N,
            rounding: RoundingMode::default(),
            separator: DEFAULT_SEPARATOR,
            output_dir: PathBuf::from("output"),
            save_to_disk: true,
            emit_report: false,
        }
    }
}

impl TriageConfig {
    /// Create a new configuration builder.
    pub fn builder() -> TriageConfigBuilder {
        TriageConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.very_high_price_threshold.is_finite() || self.very_high_price_threshold < 0.0 {
            return Err(ConfigValidationError::InvalidPriceThreshold(
                self.very_high_price_threshold,
            ));
        }

        if self.top_n == 0 {
            return Err(ConfigValidationError::InvalidTopN(self.top_n));
        }

        if !self.separator.is_ascii()
            || matches!(self.separator, b'"' | b'\n' | b'\r')
            || self.separator.is_ascii_alphanumeric()
        {
            return Err(ConfigValidationError::InvalidSeparator(
                self.separator as char,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid very-high price threshold: {0} (must be finite and non-negative)")]
    InvalidPriceThreshold(f64),

    #[error("Invalid ranking length: {0} (must be at least 1)")]
    InvalidTopN(usize),

    #[error("Invalid separator {0:?} (must be an ASCII punctuation or whitespace character)")]
    InvalidSeparator(char),
}

impl From<ConfigValidationError> for crate::error::TriageError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::TriageError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`TriageConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct TriageConfigBuilder {
    very_high_price_threshold: Option<f64>,
    top_n: Option<usize>,
    rounding: Option<RoundingMode>,
    separator: Option<u8>,
    output_dir: Option<PathBuf>,
    save_to_disk: Option<bool>,
    emit_report: Option<bool>,
}

impl TriageConfigBuilder {
    /// Set the price above which records are flagged for review.
    pub fn very_high_price_threshold(mut self, threshold: f64) -> Self {
        self.very_high_price_threshold = Some(threshold);
        self
    }

    /// Set the number of entries in each price ranking list.
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    /// Set the rounding mode for summary figures.
    pub fn rounding(mut self, mode: RoundingMode) -> Self {
        self.rounding = Some(mode);
        self
    }

    /// Set the field delimiter.
    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Set the output directory for tables and reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Enable or disable writing tables to disk.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Enable or disable the JSON run report file.
    pub fn emit_report(mut self, emit: bool) -> Self {
        self.emit_report = Some(emit);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `TriageConfig` or an error if validation fails.
    pub fn build(self) -> Result<TriageConfig, ConfigValidationError> {
        let config = TriageConfig {
            very_high_price_threshold: self
                .very_high_price_threshold
                .unwrap_or(DEFAULT_VERY_HIGH_PRICE),
            top_n: self.top_n.unwrap_or(DEFAULT_TOP_N),
            rounding: self.rounding.unwrap_or_default(),
            separator: self.separator.unwrap_or(DEFAULT_SEPARATOR),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("output")),
            save_to_disk: self.save_to_disk.unwrap_or(true),
            emit_report: self.emit_report.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }
}
