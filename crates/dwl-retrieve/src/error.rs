use dwl_imageid::ImageIdError;
use dwl_store::StoreError;
use dwl_transport::TransportError;
use dwl_types::{SeriesUid, StudyUid};

/// Errors from a retrieval.
#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    /// The request or data source configuration is unusable. Raised before
    /// any transport call.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    ImageId(#[from] ImageIdError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// An instance record lacks an identifier the cache is keyed by.
    #[error("instance record lacks {0}")]
    MissingIdentifier(&'static str),

    /// The study was reloaded while this work was in flight.
    #[error("study {0} was reloaded during retrieval")]
    Superseded(StudyUid),

    #[error("retrieval task failed: {0}")]
    Join(String),
}

impl RetrieveError {
    /// Whether a reload of the study made this work stale.
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded(_))
    }
}

pub type RetrieveResult<T> = Result<T, RetrieveError>;

/// A series the lazy strategy could not load.
#[derive(Debug)]
pub struct SeriesFailure {
    pub series: SeriesUid,
    pub reason: RetrieveError,
}
