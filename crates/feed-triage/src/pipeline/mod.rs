//! Pipeline module.
//!
//! This module provides the triage pipeline and its progress reporting.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use progress::{ClosureProgressReporter, ProgressReporter, ProgressUpdate, TriageStage};
