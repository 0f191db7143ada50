use thiserror::Error;

/// Fatal analysis errors. Per-element geometry problems never surface here;
/// the element degrades to an unknown with zero metrics and is counted on
/// the result instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A threshold that would silently invert compliance verdicts downstream.
    #[error("invalid threshold '{key}': must be a finite non-negative number, got {value}")]
    InvalidThreshold { key: String, value: f64 },

    /// A layer exclude pattern that does not compile as a glob.
    #[error("invalid layer exclude pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The run was cancelled before aggregation; no partial results exist.
    #[error("analysis cancelled before aggregation")]
    Cancelled,
}
