//! Product Feed Triage Library
//!
//! Normalizes a raw product feed and sorts every record into one of three
//! dispositions (accepted, review, rejected) with a tiered rule engine, then
//! analyzes prices over the accepted records.
//!
//! # Overview
//!
//! - **Normalization**: prices parsed, names title-cased, currencies
//!   uppercased, dates parsed; unparsable values become missing
//! - **Rule Engine**: reject rules decide first, review rules only apply to
//!   survivors, and every record carries the names of the rules that decided it
//! - **Rule Counts**: how often each rule fired across the whole input
//! - **Analytics**: mean and median price plus expensive and z-score rankings
//! - **Tables**: polars-backed CSV input and all-or-nothing CSV output
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use feed_triage::{Pipeline, TriageConfig};
//!
//! let config = TriageConfig::builder()
//!     .very_high_price_threshold(30_000.0)
//!     .output_dir("output")
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .run("data/products.csv")?;
//!
//! let counts = result.counts();
//! println!(
//!     "{} accepted, {} review, {} rejected",
//!     counts.accepted, counts.review, counts.rejected
//! );
//! ```
//!
//! # Custom Rules
//!
//! ```rust,ignore
//! use feed_triage::rules::{Rule, RuleEngine, RuleSet, RuleTier};
//!
//! let reject = RuleSet::new(
//!     RuleTier::Reject,
//!     vec![Rule::new("missing_id", |r| r.id.is_none())],
//! )?;
//! let review = RuleSet::review_rules(1_000.0);
//!
//! let pipeline = Pipeline::builder()
//!     .rule_engine(RuleEngine::with_rule_sets(reject, review)?)
//!     .build()?;
//! ```

pub mod analytics;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod reporting;
pub mod rules;
pub mod tables;
pub mod types;

// Re-exports for convenient access
pub use analytics::{
    Analytics, AnalyticsSummary, PriceAnalysis, PriceAnalysisEntry, PriceCategory,
};
pub use config::{ConfigValidationError, RoundingMode, TriageConfig, TriageConfigBuilder};
pub use error::{ResultExt, TriageError};
pub use normalizer::Normalizer;
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, ProgressReporter, ProgressUpdate,
    TriageStage,
};
pub use reporting::{ReportGenerator, RuleCountReport, RuleCountRow, RunReport};
pub use rules::{Classification, RuleEngine, derive_reason};
pub use tables::{CsvDirectorySink, MemorySink, OutputTables, TableSink, read_raw_records};
pub use types::{
    ClassifiedRecord, DispositionCounts, NormalizedRecord, RawRecord, ReviewFields, Status,
    TriageResult,
};
