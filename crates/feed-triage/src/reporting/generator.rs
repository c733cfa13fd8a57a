use super::RuleCountRow;
use crate::analytics::{AnalyticsSummary, PriceAnalysisEntry};
use crate::error::Result;
use crate::types::{DispositionCounts, TriageResult};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const REPORT_FILE_NAME: &str = "triage_report.json";

/// Machine-readable summary of a triage run.
///
/// Printed to stdout with `--json` and written to disk with `--emit-report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input feed, when the run read one
    pub input_file: Option<String>,
    /// Directory the output tables were written to
    pub output_dir: Option<String>,
    pub counts: DispositionCounts,
    pub rule_counts: Vec<RuleCountRow>,
    pub summary: AnalyticsSummary,
    pub price_analysis: Vec<PriceAnalysisEntry>,
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn build_report(
        input_file: Option<&Path>,
        output_dir: Option<&Path>,
        result: &TriageResult,
    ) -> RunReport {
        RunReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.map(|p| p.display().to_string()),
            output_dir: output_dir.map(|p| p.display().to_string()),
            counts: result.counts(),
            rule_counts: result.rule_counts.rows.clone(),
            summary: result.summary.clone(),
            price_analysis: result.price_analysis.entries().cloned().collect(),
            warnings: result.warnings.clone(),
            duration_ms: result.duration_ms,
        }
    }

    /// Write the report as pretty JSON to `<output_dir>/triage_report.json`.
    pub fn write_report(&self, report: &RunReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.output_dir.join(REPORT_FILE_NAME);
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::types::RawRecord;

    fn result() -> TriageResult {
        let records = vec![
            RawRecord::from_pairs([
                ("id", Some("1")),
                ("name", Some("lamp")),
                ("price", Some("12.5")),
                ("currency", Some("eur")),
                ("created_at", Some("2024-02-01")),
            ]),
            RawRecord::from_pairs([
                ("id", Some("2")),
                ("name", Some("chair")),
                ("price", Some("40000")),
                ("currency", Some("eur")),
                ("created_at", Some("2024-02-01")),
            ]),
        ];
        Pipeline::builder().build().unwrap().process(records).unwrap()
    }

    #[test]
    fn test_build_report_copies_run_data() {
        let result = result();
        let report = ReportGenerator::build_report(Some(Path::new("feed.csv")), None, &result);

        assert_eq!(report.input_file.as_deref(), Some("feed.csv"));
        assert_eq!(report.counts.input, 2);
        assert_eq!(report.counts.review, 1);
        assert_eq!(report.rule_counts.len(), 8);
        assert_eq!(report.summary.total_products, 1);
        // a single accepted price cannot be ranked by z-score
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path());
        let report = ReportGenerator::build_report(None, Some(dir.path()), &result());

        let path = generator.write_report(&report).unwrap();
        assert_eq!(path, dir.path().join("triage_report.json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["counts"]["accepted"], 1);
        assert_eq!(json["rule_counts"][0]["rule"], "very_high_price");
    }
}
