//! Progress reporting for the triage pipeline.
//!
//! The pipeline runs synchronously and to completion; progress updates let a
//! caller (the CLI, or an embedding application) observe stage transitions.
//!
//! # Example
//!
//! ```rust,ignore
//! use feed_triage::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(records)?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the triage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageStage {
    /// Reading the raw feed
    Loading,
    /// Converting raw values to canonical form
    Normalizing,
    /// Evaluating reject and review rules
    Classifying,
    /// Aggregating rule trigger counts
    Reporting,
    /// Computing price statistics and rankings
    Analytics,
    /// Writing output tables
    Writing,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl TriageStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Feed",
            Self::Normalizing => "Normalizing Fields",
            Self::Classifying => "Classifying Records",
            Self::Reporting => "Counting Rule Triggers",
            Self::Analytics => "Analyzing Prices",
            Self::Writing => "Writing Tables",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run attributed to this stage.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.20,
            Self::Normalizing => 0.20,
            Self::Classifying => 0.25,
            Self::Reporting => 0.05,
            Self::Analytics => 0.10,
            Self::Writing => 0.20,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Normalizing => 0.20,
            Self::Classifying => 0.40,
            Self::Reporting => 0.65,
            Self::Analytics => 0.70,
            Self::Writing => 0.80,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress update emitted at stage boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: TriageStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,

    /// Records handled so far in the current stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,
}

impl ProgressUpdate {
    pub fn new(stage: TriageStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: None,
        }
    }

    /// Stage-complete update carrying the number of records handled.
    pub fn finished(stage: TriageStage, items: usize, message: impl Into<String>) -> Self {
        Self {
            items_processed: Some(items),
            ..Self::new(stage, 1.0, message)
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(TriageStage::Complete, 1.0, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(TriageStage::Failed, 0.0, message)
    }
}

/// Trait for receiving progress updates.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
