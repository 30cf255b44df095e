use dwl_transport::TransportError;

/// Errors from bulk data resolution.
#[derive(Debug, thiserror::Error)]
pub enum BulkDataError {
    /// The transport failed to deliver the value.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The attribute holds neither a bulk data reference nor inline binary.
    #[error("attribute does not hold bulk data")]
    NotBulkData,

    /// Inline binary content is not valid base64.
    #[error("invalid inline binary: {0}")]
    InlineBinary(String),
}

/// Result alias for bulk data operations.
pub type BulkDataResult<T> = Result<T, BulkDataError>;
