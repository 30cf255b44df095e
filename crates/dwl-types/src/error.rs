use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid DICOM JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON object for a dataset, got {0}")]
    NotAnObject(&'static str),

    #[error("empty identifier for {0}")]
    EmptyIdentifier(&'static str),
}
