use thiserror::Error;

/// Workspace-wide error types for the Drape recommender.
///
/// Degenerate ranking input (missing embeddings, zero vectors, empty
/// preference) is never reported through this type; it resolves to a zero
/// score instead.
#[derive(Debug, Error)]
pub enum DrapeError {
    /// Storage layer error (catalog, embeddings, event log, mask files).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Vectors that must share one dimensionality do not.
    #[error("Dimension mismatch at vector {index}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Position of the offending vector in its input list.
        index: usize,
        /// Dimensionality established by the first vector.
        expected: usize,
        /// Dimensionality of the offending vector.
        found: usize,
    },

    /// An operation that needs at least one vector received none.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A caller-supplied parameter is out of range or malformed.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A requested base product could not be used for mask discovery.
    #[error("Base selection failed: {0}")]
    BaseSelection(String),

    /// A hosted model (image edit or embedding) call failed.
    #[error("External service error: {0}")]
    External(String),

    /// An external call exceeded its time budget.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for DrapeError {
    fn from(e: serde_json::Error) -> Self {
        DrapeError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for DrapeError {
    fn from(e: serde_yaml::Error) -> Self {
        DrapeError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for DrapeError {
    fn from(e: std::io::Error) -> Self {
        DrapeError::Storage(e.to_string())
    }
}
