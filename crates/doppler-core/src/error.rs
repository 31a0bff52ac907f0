use thiserror::Error;

#[derive(Debug, Error)]
pub enum DopplerError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Malformed statement: {0}")]
    MalformedStatement(String),

    #[error("Structural mismatch in {context}: expected {expected} values, found {actual}")]
    StructuralMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for DopplerError {
    fn from(e: serde_json::Error) -> Self {
        DopplerError::SerializationError(e.to_string())
    }
}
