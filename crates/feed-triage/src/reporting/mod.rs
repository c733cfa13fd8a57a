//! Run reporting.
//!
//! - [`RuleCountReport`]: how often each rule fired across the whole input.
//! - [`RunReport`]: JSON summary of a run, for `--json` output and
//!   `--emit-report` files.
//!
//! # Example
//!
//! ```rust,ignore
//! use feed_triage::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report(Some(input), Some(output_dir), &result);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! ReportGenerator::new(output_dir).write_report(&report)?;
//! ```

mod generator;
mod rule_counts;

pub use generator::{REPORT_FILE_NAME, ReportGenerator, RunReport};
pub use rule_counts::{RuleCountReport, RuleCountRow};
