use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl AnalysisError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(field: &str) -> Self {
        Self::invalid(field, "Result is outside the representable decimal range")
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        AnalysisError::SerializationError(e.to_string())
    }
}
