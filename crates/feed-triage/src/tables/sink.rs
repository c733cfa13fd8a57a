//! Output table sinks.

use super::OutputTables;
use crate::error::{Result, ResultExt, TriageError};
use crate::reporting::{REPORT_FILE_NAME, RunReport};
use polars::prelude::*;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Destination for a complete set of output tables.
pub trait TableSink {
    /// Write every table or none of them.
    fn write_all(&mut self, tables: &OutputTables) -> Result<()>;
}

/// Writes each table as `<name>.csv` into a directory.
///
/// Every file is first written under a hidden staging name. Files are renamed
/// into place only once all of them have been staged, and a failed rename
/// rolls back the files already published, restoring any previous versions.
#[derive(Debug, Clone)]
pub struct CsvDirectorySink {
    dir: PathBuf,
    separator: u8,
    report: Option<String>,
}

impl CsvDirectorySink {
    pub fn new(dir: impl Into<PathBuf>, separator: u8) -> Self {
        Self {
            dir: dir.into(),
            separator,
            report: None,
        }
    }

    /// Publish `report` as `triage_report.json` together with the tables.
    pub fn with_report(mut self, report: &RunReport) -> Result<Self> {
        self.report = Some(serde_json::to_string_pretty(report)?);
        Ok(self)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Final location of a table.
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }

    fn staging_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!(".{}.partial", file_name))
    }

    fn backup_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!(".{}.previous", file_name))
    }

    fn write_table(&self, path: &Path, df: &DataFrame) -> Result<()> {
        let mut file = File::create(path)?;
        let mut df = df.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(self.separator)
            .with_quote_char(b'"')
            .finish(&mut df)
            .context(format!("Writing {}", path.display()))?;
        Ok(())
    }

    fn discard(&self, staged: &[String]) {
        for file_name in staged {
            let path = self.staging_path(file_name);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove staged file {}: {}", path.display(), e),
            }
        }
    }

    /// Move one staged file into place. Returns whether a previous version
    /// was set aside.
    fn publish(&self, file_name: &str) -> io::Result<bool> {
        let target = self.dir.join(file_name);
        let backup = self.backup_path(file_name);

        let had_previous = target.is_file();
        if had_previous {
            fs::rename(&target, &backup)?;
        }

        if let Err(e) = fs::rename(self.staging_path(file_name), &target) {
            if had_previous {
                if let Err(restore) = fs::rename(&backup, &target) {
                    warn!("Could not restore {}: {}", target.display(), restore);
                }
            }
            return Err(e);
        }

        Ok(had_previous)
    }

    fn rollback(&self, published: &[(&str, bool)]) {
        for (file_name, had_previous) in published.iter().rev() {
            let target = self.dir.join(file_name);
            let undone = if *had_previous {
                fs::rename(self.backup_path(file_name), &target)
            } else {
                fs::remove_file(&target)
            };
            match undone {
                Ok(()) => debug!("Rolled back {}", target.display()),
                Err(e) => warn!("Could not roll back {}: {}", target.display(), e),
            }
        }
    }

    fn commit(&self, staged: &[String]) -> Result<()> {
        let mut published: Vec<(&str, bool)> = Vec::with_capacity(staged.len());

        for (index, file_name) in staged.iter().enumerate() {
            match self.publish(file_name) {
                Ok(had_previous) => published.push((file_name.as_str(), had_previous)),
                Err(e) => {
                    self.rollback(&published);
                    self.discard(&staged[index..]);
                    return Err(
                        TriageError::from(e).with_context(format!("Publishing {}", file_name))
                    );
                }
            }
        }

        for (file_name, had_previous) in published {
            if had_previous {
                let backup = self.backup_path(file_name);
                if let Err(e) = fs::remove_file(&backup) {
                    warn!("Could not remove {}: {}", backup.display(), e);
                }
            }
        }
        Ok(())
    }
}

impl TableSink for CsvDirectorySink {
    fn write_all(&mut self, tables: &OutputTables) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let mut staged = Vec::new();
        for (name, df) in tables.iter() {
            let file_name = format!("{}.csv", name);
            let path = self.staging_path(&file_name);
            staged.push(file_name);
            if let Err(e) = self.write_table(&path, df) {
                self.discard(&staged);
                return Err(e.with_context(format!("Writing table '{}'", name)));
            }
            debug!("Staged {} ({} rows)", path.display(), df.height());
        }

        if let Some(report) = &self.report {
            staged.push(REPORT_FILE_NAME.to_string());
            if let Err(e) = fs::write(self.staging_path(REPORT_FILE_NAME), report) {
                self.discard(&staged);
                return Err(TriageError::from(e).with_context("Writing run report"));
            }
        }

        self.commit(&staged)?;

        info!("Wrote {} files to {}", staged.len(), self.dir.display());
        Ok(())
    }
}

/// Keeps written tables in memory, keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    tables: Vec<(String, DataFrame)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&DataFrame> {
        self.tables
            .iter()
            .find(|(table, _)| table == name)
            .map(|(_, df)| df)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl TableSink for MemorySink {
    fn write_all(&mut self, tables: &OutputTables) -> Result<()> {
        self.tables = tables
            .iter()
            .into_iter()
            .map(|(name, df)| (name.to_string(), df.clone()))
            .collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriageConfig;
    use crate::pipeline::Pipeline;
    use crate::reporting::ReportGenerator;
    use crate::types::{RawRecord, TriageResult};
    use pretty_assertions::assert_eq;

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
                ("name", Some("desk")),
                ("price", Some("80")),
                ("currency", Some("eur")),
                ("created_at", Some("2024-02-02")),
            ]),
        ];
        Pipeline::builder()
            .config(TriageConfig::builder().save_to_disk(false).build().unwrap())
            .build()
            .unwrap()
            .process(records)
            .unwrap()
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_writes_tables_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let result = result();
        let report = ReportGenerator::build_report(None, Some(dir.path()), &result);

        let mut sink = CsvDirectorySink::new(dir.path(), b';')
            .with_report(&report)
            .unwrap();
        sink.write_all(&OutputTables::from_result(&result).unwrap())
            .unwrap();

        assert_eq!(
            file_names(dir.path()),
            vec![
                "accepted_products.csv",
                "analytics_summary.csv",
                "price_analysis.csv",
                "rejected_products.csv",
                "review_products.csv",
                "rule_counts.csv",
                "triage_report.json",
            ]
        );
    }

    #[test]
    fn test_overwrites_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rule_counts.csv"), "stale").unwrap();

        let mut sink = CsvDirectorySink::new(dir.path(), b';');
        sink.write_all(&OutputTables::from_result(&result()).unwrap())
            .unwrap();

        let rule_counts = fs::read_to_string(sink.table_path("rule_counts")).unwrap();
        assert!(rule_counts.starts_with("rule;"));
        assert_eq!(file_names(dir.path()).len(), OutputTables::NAMES.len());
    }

    #[test]
    fn test_failed_publish_leaves_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("analytics_summary.csv"), "previous run").unwrap();
        // a non-empty directory cannot be replaced by a file
        let blocked = dir.path().join("rule_counts.csv");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep.txt"), "x").unwrap();

        let result = result();
        let report = ReportGenerator::build_report(None, Some(dir.path()), &result);
        let mut sink = CsvDirectorySink::new(dir.path(), b';')
            .with_report(&report)
            .unwrap();

        let err = sink
            .write_all(&OutputTables::from_result(&result).unwrap())
            .unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");

        assert_eq!(
            file_names(dir.path()),
            vec!["analytics_summary.csv", "rule_counts.csv"]
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("analytics_summary.csv")).unwrap(),
            "previous run"
        );
        assert!(blocked.join("keep.txt").is_file());
    }
}
