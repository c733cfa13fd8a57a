//! Custom error types for the triage pipeline.
//!
//! Field-level problems never surface here: they are recovered as missing
//! values by the normalizer. This type covers structural input failures,
//! the degenerate-distribution condition raised by the analytics stage,
//! and I/O wrappers.
//!
//! Errors are serializable so they can be emitted as part of a JSON report.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the triage pipeline.
#[derive(Error, Debug)]
pub enum TriageError {
    /// A required column is absent from the input source.
    #[error("Required column '{column}' not found in input (available columns: {available:?})")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// The input source could not be read or parsed as delimited text.
    #[error("Input source '{path}' is unreadable: {reason}")]
    SourceUnreadable { path: String, reason: String },

    /// Too few observations or zero variance for z-score computation.
    #[error("Degenerate price distribution over {observations} value(s): {reason}")]
    DegenerateDistribution { observations: usize, reason: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<TriageError>,
    },
}

impl TriageError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TriageError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingColumn { .. } => "MISSING_COLUMN",
            Self::SourceUnreadable { .. } => "SOURCE_UNREADABLE",
            Self::DegenerateDistribution { .. } => "DEGENERATE_DISTRIBUTION",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Structural failures abort the run before any classification happens.
    pub fn is_structural(&self) -> bool {
        match self {
            Self::MissingColumn { .. } | Self::SourceUnreadable { .. } => true,
            Self::WithContext { source, .. } => source.is_structural(),
            _ => false,
        }
    }

    /// Check if this error is the degenerate-distribution condition.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::DegenerateDistribution { .. } => true,
            Self::WithContext { source, .. } => source.is_degenerate(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for TriageError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("TriageError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| TriageError::Polars(e).with_context(context))
    }
}
