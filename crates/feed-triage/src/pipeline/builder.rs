//! Main triage pipeline.
//!
//! This module provides the `Pipeline` struct and builder that chain the
//! stages: normalize, classify, count rule triggers, analyze prices, write.

use crate::analytics::Analytics;
use crate::config::{ConfigValidationError, TriageConfig};
use crate::error::Result;
use crate::normalizer::Normalizer;
use crate::pipeline::progress::{
    ClosureProgressReporter, ProgressReporter, ProgressUpdate, TriageStage,
};
use crate::reporting::{ReportGenerator, RuleCountReport};
use crate::rules::RuleEngine;
use crate::tables::{self, CsvDirectorySink, OutputTables, TableSink};
use crate::types::{RawRecord, TriageResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// The triage pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use feed_triage::{Pipeline, TriageConfig};
///
/// // From a file, writing the output tables
/// let result = Pipeline::builder()
///     .config(TriageConfig::builder().output_dir("out").build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run("data/products.csv")?;
///
/// // From records already in memory, writing nothing
/// let result = Pipeline::builder().build()?.process(records)?;
/// ```
pub struct Pipeline {
    config: TriageConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    engine: RuleEngine,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Triage records that are already in memory. Nothing is written.
    pub fn process(&self, records: Vec<RawRecord>) -> Result<TriageResult> {
        self.finish(self.process_internal(records))
    }

    /// Load a feed, triage it, and write the output tables when
    /// `save_to_disk` is set.
    ///
    /// Tables (and the run report when `emit_report` is set) are published
    /// together only after every one of them has been staged, so a failed run
    /// leaves no partial output behind. `duration_ms` covers loading and
    /// triage, not writing.
    pub fn run(&self, input: impl AsRef<Path>) -> Result<TriageResult> {
        self.finish(self.run_internal(input.as_ref()))
    }

    /// Render the output tables of `result` into `sink`.
    pub fn write_tables(&self, result: &TriageResult, sink: &mut dyn TableSink) -> Result<()> {
        self.report_progress(ProgressUpdate::new(
            TriageStage::Writing,
            0.0,
            "Building output tables...",
        ));
        let tables = OutputTables::from_result(result)?;
        sink.write_all(&tables)?;
        self.report_progress(ProgressUpdate::finished(
            TriageStage::Writing,
            OutputTables::NAMES.len(),
            "Output tables written",
        ));
        Ok(())
    }

    fn finish(&self, outcome: Result<TriageResult>) -> Result<TriageResult> {
        match outcome {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Triage completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self, input: &Path) -> Result<TriageResult> {
        let start_time = Instant::now();

        self.report_progress(ProgressUpdate::new(
            TriageStage::Loading,
            0.0,
            format!("Loading {}...", input.display()),
        ));
        let records = tables::read_raw_records(input, self.config.separator)?;
        self.report_progress(ProgressUpdate::finished(
            TriageStage::Loading,
            records.len(),
            "Feed loaded",
        ));

        let mut result = self.process_internal(records)?;
        result.duration_ms = start_time.elapsed().as_millis() as u64;

        let report = self.config.emit_report.then(|| {
            ReportGenerator::build_report(
                Some(input),
                self.config.save_to_disk.then_some(self.config.output_dir.as_path()),
                &result,
            )
        });

        if self.config.save_to_disk {
            let mut sink = CsvDirectorySink::new(&self.config.output_dir, self.config.separator);
            if let Some(report) = &report {
                sink = sink.with_report(report)?;
            }
            self.write_tables(&result, &mut sink)?;
        } else {
            info!("Skipping table output (save_to_disk disabled)");
            if let Some(report) = &report {
                ReportGenerator::new(&self.config.output_dir).write_report(report)?;
            }
        }

        Ok(result)
    }

    fn process_internal(&self, records: Vec<RawRecord>) -> Result<TriageResult> {
        let start_time = Instant::now();
        info!("Starting triage of {} records...", records.len());

        // Step 1: Normalize
        self.report_progress(ProgressUpdate::new(
            TriageStage::Normalizing,
            0.0,
            "Normalizing fields...",
        ));
        let normalized = Normalizer::normalize(&records);
        self.report_progress(ProgressUpdate::finished(
            TriageStage::Normalizing,
            normalized.len(),
            "Normalization complete",
        ));

        // Step 2: Classify
        self.report_progress(ProgressUpdate::new(
            TriageStage::Classifying,
            0.0,
            "Evaluating rules...",
        ));
        let classification = self.engine.classify(normalized.clone());
        self.report_progress(ProgressUpdate::finished(
            TriageStage::Classifying,
            classification.evaluations.len(),
            "Classification complete",
        ));

        // Step 3: Rule counts
        let rule_counts = RuleCountReport::from_evaluations(&classification.evaluations);
        self.report_progress(ProgressUpdate::finished(
            TriageStage::Reporting,
            rule_counts.len(),
            "Rule counts ready",
        ));

        // Step 4: Analytics over the accepted partition
        let summary = Analytics::summarize(&classification.accepted, self.config.rounding);
        let price_analysis = Analytics::analyze_prices(&classification.accepted, self.config.top_n);
        self.report_progress(ProgressUpdate::finished(
            TriageStage::Analytics,
            classification.accepted.len(),
            "Price analysis complete",
        ));

        let mut warnings = Vec::new();
        if let Some(reason) = &price_analysis.degenerate {
            warnings.push(format!("Outlier ranking skipped: {}", reason));
        }
        if summary.missing_price_count > 0 {
            warnings.push(format!(
                "{} accepted records have no price",
                summary.missing_price_count
            ));
        }
        for warning in &warnings {
            warn!("{}", warning);
        }

        Ok(TriageResult {
            normalized,
            classification,
            rule_counts,
            summary,
            price_analysis,
            warnings,
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}

/// Builder for creating a [`Pipeline`] with custom configuration.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<TriageConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    engine: Option<RuleEngine>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: TriageConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Replace the built-in rule sets.
    ///
    /// When set, `very_high_price_threshold` from the config is not consulted.
    pub fn rule_engine(mut self, engine: RuleEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let engine = self.engine.unwrap_or_else(|| RuleEngine::new(&config));

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            engine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Rule, RuleSet, RuleTier};
    use crate::tables::MemorySink;
    use crate::types::Status;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raw(id: &str, price: &str) -> RawRecord {
        RawRecord::from_pairs([
            ("id", Some(id)),
            ("name", Some("thing")),
            ("price", Some(price)),
            ("currency", Some("usd")),
            ("created_at", Some("2024-03-01")),
        ])
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config().top_n, 10);
        assert_eq!(pipeline.engine().reject_rules().len(), 5);
        assert_eq!(pipeline.engine().review_rules().len(), 3);
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = TriageConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_threshold_flows_into_engine() {
        let config = TriageConfig::builder()
            .very_high_price_threshold(100.0)
            .build()
            .unwrap();
        let pipeline = Pipeline::builder().config(config).build().unwrap();

        let result = pipeline.process(vec![raw("1", "150"), raw("2", "50")]).unwrap();
        assert_eq!(result.review()[0].reason.as_deref(), Some("very_high_price"));
        assert_eq!(result.counts().accepted, 1);
    }

    #[test]
    fn test_process_partitions_and_counts() {
        let pipeline = Pipeline::builder().build().unwrap();
        let result = pipeline
            .process(vec![raw("1", "10"), raw("2", "0"), raw("3", "-1"), raw("4", "30")])
            .unwrap();

        let counts = result.counts();
        assert_eq!(counts.input, 4);
        assert_eq!(counts.accepted, 2);
        assert_eq!(counts.review, 1);
        assert_eq!(counts.rejected, 1);
        assert_eq!(result.normalized.len(), 4);
        assert_eq!(result.summary.missing_price_count, 0);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_degenerate_distribution_is_a_warning() {
        let pipeline = Pipeline::builder().build().unwrap();
        let result = pipeline.process(vec![raw("1", "5"), raw("2", "5")]).unwrap();

        assert!(result.price_analysis.top_outliers.is_empty());
        assert_eq!(result.price_analysis.top_expensive.len(), 2);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Outlier ranking skipped"));
    }

    #[test]
    fn test_pipeline_builder_with_progress_callback() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| {
                stages_clone.lock().unwrap().push(update.stage);
            })
            .build()
            .unwrap();

        pipeline.process(vec![raw("1", "10")]).unwrap();

        let stages = stages.lock().unwrap();
        assert_eq!(stages.first(), Some(&TriageStage::Normalizing));
        assert_eq!(stages.last(), Some(&TriageStage::Complete));
        assert!(stages.contains(&TriageStage::Analytics));
    }

    #[test]
    fn test_run_failure_reports_failed_stage() {
        let failures = Arc::new(AtomicUsize::new(0));
        let failures_clone = failures.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| {
                if update.stage == TriageStage::Failed {
                    failures_clone.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
            .unwrap();

        let err = pipeline.run("/no/such/feed.csv").unwrap_err();
        assert!(err.is_structural());
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_rule_engine() {
        let reject = RuleSet::new(
            RuleTier::Reject,
            vec![Rule::new("no_eur", |r| r.currency.as_deref() == Some("EUR"))],
        )
        .unwrap();
        let review = RuleSet::new(RuleTier::Review, vec![]).unwrap();
        let engine = RuleEngine::with_rule_sets(reject, review).unwrap();

        let pipeline = Pipeline::builder().rule_engine(engine).build().unwrap();
        let eur = raw("1", "10").with("currency", Some(" eur "));
        let result = pipeline.process(vec![eur, raw("2", "-3")]).unwrap();

        assert_eq!(result.rejected()[0].reason.as_deref(), Some("no_eur"));
        // the built-in negative_price rule is not part of this engine
        assert_eq!(result.accepted()[0].status, Status::Accepted);
        assert_eq!(result.rule_counts.len(), 1);
    }

    #[test]
    fn test_write_tables_to_memory() {
        let pipeline = Pipeline::builder().build().unwrap();
        let result = pipeline.process(vec![raw("1", "10"), raw("2", "0")]).unwrap();

        let mut sink = MemorySink::new();
        pipeline.write_tables(&result, &mut sink).unwrap();

        assert_eq!(sink.names(), OutputTables::NAMES.to_vec());
        assert_eq!(sink.get("review_products").unwrap().height(), 1);
    }
}
