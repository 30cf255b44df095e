use dwl_types::{SeriesUid, StudyUid};

/// Errors from metadata store reads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown study: {0}")]
    UnknownStudy(StudyUid),

    #[error("unknown series {series} in study {study}")]
    UnknownSeries { study: StudyUid, series: SeriesUid },
}

pub type StoreResult<T> = Result<T, StoreError>;
