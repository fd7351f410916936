use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ValuationError {
    #[error("Parse error: {field} value {value:?} ({reason})")]
    Parse {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Undefined result: {context}")]
    UndefinedResult { context: String },

    #[error("Missing input: {field} was reported as {sentinel:?}")]
    MissingInput { field: String, sentinel: String },

    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ValuationError {
    pub(crate) fn undefined(context: impl Into<String>) -> Self {
        ValuationError::UndefinedResult {
            context: context.into(),
        }
    }

    pub(crate) fn parse(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ValuationError::Parse {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable tag for the error class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValuationError::Parse { .. } => ErrorKind::Parse,
            ValuationError::UndefinedResult { .. } => ErrorKind::Undefined,
            ValuationError::MissingInput { .. } => ErrorKind::Missing,
            ValuationError::InvalidInput { .. } => ErrorKind::Invalid,
            ValuationError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

/// Error class, carried alongside partial results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Parse,
    Undefined,
    Missing,
    Invalid,
    Serialization,
}

impl From<serde_json::Error> for ValuationError {
    fn from(e: serde_json::Error) -> Self {
        ValuationError::Serialization(e.to_string())
    }
}
