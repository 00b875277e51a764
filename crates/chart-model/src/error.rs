use thiserror::Error;

/// Errors raised when a value falls outside one of the closed enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("unknown pattern id: {0}")]
    UnknownPattern(String),
    #[error("unknown auxiliary element: {0}")]
    UnknownAuxiliary(String),
    #[error("unknown encoding channel: {0}")]
    UnknownChannel(String),
    #[error("unknown semantic type: {0}")]
    UnknownSemanticType(String),
    #[error("invalid option {field}: {reason}")]
    InvalidOption { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
