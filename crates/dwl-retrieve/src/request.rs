use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use dwl_imageid::FrameRangeMapper;
use dwl_types::{SeriesSummary, StudyUid};

use crate::error::{RetrieveError, RetrieveResult};

/// How the series of a study are fetched and committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Eager,
    Lazy,
}

/// Keeps a listed series when it returns true.
pub type SeriesFilter = Arc<dyn Fn(&SeriesSummary) -> bool + Send + Sync>;

/// Caller-supplied series ordering, applied after any sort criteria.
pub type SeriesSortFn = Arc<dyn Fn(&SeriesSummary, &SeriesSummary) -> Ordering + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    SeriesNumber,
    /// `SeriesDate` plus `SeriesTime`.
    SeriesDateTime,
    Modality,
    Description,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Ordered sort keys. Series missing a key sort after those that have it,
/// whatever the direction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortCriteria {
    keys: Vec<(SortKey, SortDirection)>,
}

impl SortCriteria {
    /// No criteria: listing order is kept.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tie-breaking key.
    pub fn then(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.keys.push((key, direction));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compare by each key in turn. Missing values sort last.
    pub fn compare(&self, a: &SeriesSummary, b: &SeriesSummary) -> Ordering {
        self.keys
            .iter()
            .map(|&(key, direction)| {
                let ordering = match key {
                    SortKey::SeriesNumber => missing_last(a.series_number, b.series_number),
                    SortKey::SeriesDateTime => missing_last(series_datetime(a), series_datetime(b)),
                    SortKey::Modality => missing_last(a.modality.as_deref(), b.modality.as_deref()),
                    SortKey::Description => missing_last(a.description.as_deref(), b.description.as_deref()),
                };
                match (direction, ordering) {
                    (SortDirection::Descending, Directed::Present(o)) => o.reverse(),
                    (_, Directed::Present(o)) | (_, Directed::Missing(o)) => o,
                }
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

enum Directed {
    /// Both present; flips with the direction.
    Present(Ordering),
    /// At least one side missing; never flips.
    Missing(Ordering),
}

fn missing_last<T: Ord>(a: Option<T>, b: Option<T>) -> Directed {
    match (a, b) {
        (Some(a), Some(b)) => Directed::Present(a.cmp(&b)),
        (Some(_), None) => Directed::Missing(Ordering::Less),
        (None, Some(_)) => Directed::Missing(Ordering::Greater),
        (None, None) => Directed::Missing(Ordering::Equal),
    }
}

/// DICOM DA/TM pair as a timestamp. A missing or unreadable time counts as
/// midnight.
fn series_datetime(summary: &SeriesSummary) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(summary.series_date.as_deref()?.trim(), "%Y%m%d").ok()?;
    let time = summary
        .series_time
        .as_deref()
        .and_then(parse_time)
        .unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time))
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    let (whole, _fraction) = value.split_once('.').unwrap_or((value, ""));
    let padded = format!("{whole:0<6}");
    NaiveTime::parse_from_str(&padded, "%H%M%S").ok()
}

/// What to load and how.
#[derive(Clone, Default)]
pub struct RetrieveRequest {
    pub study: Option<StudyUid>,
    pub filter: Option<SeriesFilter>,
    pub sort_criteria: SortCriteria,
    pub sort_fn: Option<SeriesSortFn>,
    pub made_locally: bool,
    /// `Some(false)` withholds credentials from every request this retrieval
    /// makes. It cannot enable credentials the data source withholds.
    pub allow_credentialed_requests: Option<bool>,
    /// Overrides the data source's default strategy.
    pub strategy: Option<Strategy>,
    pub range_mapper: Option<Arc<dyn FrameRangeMapper>>,
    /// Overrides the data source's concurrency cap.
    pub max_concurrent_series: Option<usize>,
}

impl RetrieveRequest {
    /// Request for `study` with every other option at its default.
    pub fn new(study: impl Into<StudyUid>) -> Self {
        Self {
            study: Some(study.into()),
            ..Default::default()
        }
    }

    /// Keep only the listed series `filter` accepts.
    pub fn with_filter(mut self, filter: impl Fn(&SeriesSummary) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Order series by `criteria` before any fetch.
    pub fn with_sort_criteria(mut self, criteria: SortCriteria) -> Self {
        self.sort_criteria = criteria;
        self
    }

    pub fn with_sort_fn(
        mut self,
        sort: impl Fn(&SeriesSummary, &SeriesSummary) -> Ordering + Send + Sync + 'static,
    ) -> Self {
        self.sort_fn = Some(Arc::new(sort));
        self
    }

    /// Tag committed records as locally made.
    pub fn made_locally(mut self, made_locally: bool) -> Self {
        self.made_locally = made_locally;
        self
    }

    /// Override the data source's default strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Choose frame ranges per series for multi-frame instances.
    pub fn with_range_mapper(mut self, mapper: impl FrameRangeMapper + 'static) -> Self {
        self.range_mapper = Some(Arc::new(mapper));
        self
    }

    /// Cap concurrent series fetches for this request.
    pub fn with_max_concurrent_series(mut self, limit: usize) -> Self {
        self.max_concurrent_series = Some(limit);
        self
    }

    /// Pass `false` to send this retrieval's requests without credentials.
    pub fn allow_credentialed_requests(mut self, allow: bool) -> Self {
        self.allow_credentialed_requests = Some(allow);
        self
    }

    /// The study to load. Fails before any I/O when it is absent or blank.
    pub fn study(&self) -> RetrieveResult<&StudyUid> {
        self.study
            .as_ref()
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| RetrieveError::Configuration("a study id is required".into()))
    }

    /// Drop filtered-out series, then order the rest.
    pub fn arrange(&self, mut summaries: Vec<SeriesSummary>) -> Vec<SeriesSummary> {
        if let Some(filter) = &self.filter {
            summaries.retain(|s| filter(s));
        }
        if !self.sort_criteria.is_empty() {
            summaries.sort_by(|a, b| self.sort_criteria.compare(a, b));
        }
        if let Some(sort) = &self.sort_fn {
            summaries.sort_by(|a, b| sort(a, b));
        }
        summaries
    }
}

impl fmt::Debug for RetrieveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrieveRequest")
            .field("study", &self.study)
            .field("filter", &self.filter.is_some())
            .field("sort_criteria", &self.sort_criteria)
            .field("sort_fn", &self.sort_fn.is_some())
            .field("made_locally", &self.made_locally)
            .field("allow_credentialed_requests", &self.allow_credentialed_requests)
            .field("strategy", &self.strategy)
            .field("range_mapper", &self.range_mapper.is_some())
            .field("max_concurrent_series", &self.max_concurrent_series)
            .finish()
    }
}
