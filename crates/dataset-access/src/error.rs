//! Error types for dataset access.

use thiserror::Error;

/// Errors that can occur while opening or reading a dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Failed to open the dataset source.
    #[error("failed to open dataset: {0}")]
    OpenFailed(String),

    /// Failed to read data from the dataset.
    #[error("failed to read dataset: {0}")]
    ReadFailed(String),

    /// A required dimension is missing.
    #[error("missing dimension: {0}")]
    MissingDimension(String),

    /// A required variable is missing.
    #[error("missing variable: {0}")]
    MissingVariable(String),

    /// A required attribute is missing.
    #[error("missing attribute {attr} on variable {var}")]
    MissingAttribute { var: String, attr: String },

    /// The dataset layout does not match the expected shape.
    #[error("invalid dataset layout: {0}")]
    InvalidLayout(String),

    /// Invalid schema configuration.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatasetError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an InvalidLayout error.
    pub fn invalid_layout(msg: impl Into<String>) -> Self {
        Self::InvalidLayout(msg.into())
    }
}

/// Result type for dataset access operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
