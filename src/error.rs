//! Error types for jpeg-sweep operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for jpeg-sweep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while sweeping, measuring, or aggregating.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Failed to decode the source image or encode a variant.
    #[error("Variant generation failed: {path}: {reason}")]
    Generation {
        /// Path to the image involved in the failure.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Unknown metric name. This is a configuration error, never retried.
    #[error("Unsupported metric: {0:?} (expected \"ssim\" or \"psnr\")")]
    UnsupportedMetric(String),

    /// The comparison tool's output did not contain the expected statistic.
    #[error("No {metric} statistic in comparison output: {reason}")]
    MetricParse {
        /// Name of the metric being extracted.
        metric: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to launch the external comparison tool.
    #[error("Comparison tool failed: {0}")]
    ComparisonTool(String),

    /// Per-variant series did not line up when joining by quality level.
    #[error("Assembly failed: {0}")]
    Assembly(String),

    /// Aggregation was asked to average zero retained images.
    #[error("Cannot aggregate: no images were processed successfully")]
    EmptyAggregate,

    /// Retained images disagree on the set of swept quality levels.
    #[error("Quality level mismatch: {0}")]
    QualityMismatch(String),

    /// Top-level input path is neither a file nor a directory.
    #[error("Invalid source path: {0} (not a file or directory)")]
    InvalidSource(PathBuf),

    /// Failed to build a worker pool.
    #[error("Worker pool error: {0}")]
    Pool(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
