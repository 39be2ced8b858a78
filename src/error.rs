//! Error types for the resampling engine

use thiserror::Error;

/// Result type alias for resampling operations
pub type Result<T> = std::result::Result<T, ResampleError>;

/// Main error type for the resampling engine
#[derive(Error, Debug)]
pub enum ResampleError {
    #[error("Unknown SMOTE variant: {name}. Available variants: {}", .available.join(", "))]
    UnknownVariant {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Expected n_neighbors <= n_samples, but n_samples = {available}, n_neighbors = {requested}")]
    NeighborCount { requested: usize, available: usize },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Expected exactly 2 classes, found {found}")]
    ClassCount { found: usize },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for ResampleError {
    fn from(err: polars::error::PolarsError) -> Self {
        ResampleError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ResampleError {
    fn from(err: serde_json::Error) -> Self {
        ResampleError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ResampleError {
    fn from(err: ndarray::ShapeError) -> Self {
        ResampleError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
