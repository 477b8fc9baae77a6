//! Error types for segraph.

use thiserror::Error;

/// Segraph error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Lengths or row counts disagree (e.g. index length vs. value rows).
    #[error("shape mismatch in {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    /// Unknown or unsupported aggregation.
    #[error("invalid aggregation: {0}")]
    InvalidAggregation(String),

    /// Nothing to infer a size from.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// `collate` was handed no graphs.
    #[error("empty batch: at least one graph is required")]
    EmptyBatch,

    /// Graphs in a batch disagree on the presence or shape of a field.
    #[error("feature shape mismatch in graph {graph} ({field}): expected {expected}, got {got}")]
    FeatureShapeMismatch {
        graph: usize,
        field: &'static str,
        expected: String,
        got: String,
    },

    /// An index points past the end of the thing it indexes.
    #[error("index out of bounds in {context}: {index} >= {bound}")]
    IndexOutOfBounds {
        context: &'static str,
        index: usize,
        bound: usize,
    },

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// ndarray shape error.
    #[error("tensor error: {0}")]
    Tensor(#[from] ndarray::ShapeError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
