//! Progressive retrieval: summaries first, then one independent unit of
//! work per series.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use dwl_types::{SeriesSummary, SeriesUid, StudyUid};

use crate::error::{RetrieveError, RetrieveResult, SeriesFailure};
use crate::listing::list_series;
use crate::records::{build_records, fetch_series, own_series};
use crate::request::RetrieveRequest;
use crate::session::RetrieveSession;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeriesSuccess {
    pub series: SeriesUid,
    pub instance_count: usize,
}

/// Terminal state of every series unit of a lazy retrieval.
#[derive(Debug)]
pub struct BatchReport {
    pub study: StudyUid,
    pub succeeded: Vec<SeriesSuccess>,
    pub failed: Vec<SeriesFailure>,
    /// False only when the study was reloaded while the units ran.
    pub loaded: bool,
}

impl BatchReport {
    /// True when no series failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Instances committed across the succeeded series.
    pub fn instance_count(&self) -> usize {
        self.succeeded.iter().map(|s| s.instance_count).sum()
    }
}

/// A lazy retrieval in progress. Summaries are already cached.
pub struct LazyRetrieval {
    study: StudyUid,
    summaries: Vec<SeriesSummary>,
    completion: JoinHandle<BatchReport>,
}

impl LazyRetrieval {
    /// The study being loaded.
    pub fn study(&self) -> &StudyUid {
        &self.study
    }

    /// Series summaries committed before any series fetch started.
    pub fn summaries(&self) -> &[SeriesSummary] {
        &self.summaries
    }

    /// Wait for every series unit to finish.
    pub async fn completion(self) -> RetrieveResult<BatchReport> {
        self.completion.await.map_err(|e| RetrieveError::Join(e.to_string()))
    }
}

pub(crate) async fn retrieve(session: &RetrieveSession, request: &RetrieveRequest) -> RetrieveResult<LazyRetrieval> {
    let study = request.study()?.clone();
    let session = &session.for_request(request);
    let limit = session.concurrency_limit(request)?;
    let epoch = session.store().epoch(&study);
    debug!(%study, epoch, credentialed = ?request.allow_credentialed_requests, "lazy retrieval started");

    let summaries = list_series(session, &study, request).await?;
    if !session
        .store()
        .commit_if_current(&study, epoch, &summaries, &[], request.made_locally)?
    {
        return Err(RetrieveError::Superseded(study));
    }
    info!(%study, series = summaries.len(), "series summaries cached");

    let series: Vec<SeriesUid> = summaries.iter().map(|s| s.series.clone()).collect();
    let completion = tokio::spawn(run_units(
        session.clone(),
        request.clone(),
        study.clone(),
        epoch,
        series,
        limit,
    ));
    Ok(LazyRetrieval {
        study,
        summaries,
        completion,
    })
}

async fn run_units(
    session: RetrieveSession,
    request: RetrieveRequest,
    study: StudyUid,
    epoch: u64,
    series: Vec<SeriesUid>,
    limit: Option<Arc<Semaphore>>,
) -> BatchReport {
    let mut units = Vec::with_capacity(series.len());
    for uid in &series {
        units.push(run_unit(&session, &request, &study, uid, epoch, limit.as_ref()));
    }
    let outcomes = join_all(units).await;

    let mut report = BatchReport {
        study: study.clone(),
        succeeded: Vec::new(),
        failed: Vec::new(),
        loaded: false,
    };
    for (series, outcome) in outcomes {
        match outcome {
            Ok(instance_count) => report.succeeded.push(SeriesSuccess { series, instance_count }),
            Err(reason) => {
                if reason.is_superseded() {
                    debug!(%study, %series, "series commit dropped after reload");
                } else {
                    warn!(%study, %series, error = %reason, "series retrieval failed");
                }
                report.failed.push(SeriesFailure { series, reason });
            }
        }
    }

    match session.store().mark_loaded_if_current(&study, epoch) {
        Ok(true) => report.loaded = true,
        Ok(false) => debug!(%study, epoch, "study reloaded, leaving loaded flag to the newer retrieval"),
        Err(e) => warn!(%study, error = %e, "could not mark study loaded"),
    }
    info!(
        %study,
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        instances = report.instance_count(),
        "lazy retrieval finished"
    );
    report
}

async fn run_unit(
    session: &RetrieveSession,
    request: &RetrieveRequest,
    study: &StudyUid,
    series: &SeriesUid,
    epoch: u64,
    limit: Option<&Arc<Semaphore>>,
) -> (SeriesUid, RetrieveResult<usize>) {
    let outcome = load_series(session, request, study, series, epoch, limit).await;
    (series.clone(), outcome)
}

/// One series unit: fetch, build, commit. Returns the committed count.
async fn load_series(
    session: &RetrieveSession,
    request: &RetrieveRequest,
    study: &StudyUid,
    series: &SeriesUid,
    epoch: u64,
    limit: Option<&Arc<Semaphore>>,
) -> RetrieveResult<usize> {
    let store = session.store();
    if store.epoch(study) != epoch {
        return Err(RetrieveError::Superseded(study.clone()));
    }
    let wire = fetch_series(session, study, series, limit).await?;
    let records = own_series(
        series,
        build_records(session, study, series, &wire, request.range_mapper.as_deref())?,
    );
    if !store.commit_if_current(study, epoch, &[], &records, request.made_locally)? {
        return Err(RetrieveError::Superseded(study.clone()));
    }
    debug!(%study, %series, instances = records.len(), "series committed");
    Ok(records.len())
}
