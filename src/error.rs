//! Error types for the voc-eval library.

use serde::Serialize;
use thiserror::Error;

/// Result type for voc-eval operations.
pub type Result<T> = std::result::Result<T, VocEvalError>;

/// Errors that stop an operation outright.
///
/// Problems with individual records never surface here; those are collected
/// as [`EvalIssue`] values so the rest of the run can continue.
#[derive(Error, Debug)]
pub enum VocEvalError {
    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid annotation data, for annotation sources that fail as a whole.
    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    /// Empty dataset or vocabulary provided.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Invalid IoU or confidence threshold.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// A prediction source failed to produce detections.
    #[error("Prediction source error: {0}")]
    PredictionSource(String),
}

/// A record-level problem found while building or evaluating a dataset.
///
/// Issues are recorded on the result instead of aborting the run.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvalIssue {
    /// A box with `max < min` or a non-finite coordinate was rejected.
    #[error("malformed box in image '{image}' for class '{class}': {reason}")]
    MalformedBox {
        image: String,
        class: String,
        reason: String,
    },

    /// A record referenced a class outside the vocabulary.
    #[error("unknown class '{label}' in image '{image}'")]
    UnknownClass { image: String, label: String },

    /// A prediction carried a NaN or infinite score.
    #[error("invalid score {score} in image '{image}' for class '{class}'")]
    InvalidScore {
        image: String,
        class: String,
        score: f64,
    },

    /// A raw annotation token could not be parsed.
    #[error("unparsable record '{record}' in image '{image}': {reason}")]
    UnparsableRecord {
        image: String,
        record: String,
        reason: String,
    },

    /// The prediction source returned an error for one image.
    #[error("prediction source failed for image '{image}': {reason}")]
    PredictionSourceFailed { image: String, reason: String },

    /// A class has predictions but no ground truth; its recall is pinned to 0.
    #[error("class '{class}' has {predictions} predictions but no ground truth")]
    DegenerateGroundTruth { class: String, predictions: usize },
}
