//! All-or-nothing retrieval: every series is fetched before anything is
//! committed.

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use dwl_types::{InstanceRecord, SeriesSummary, StudyUid};

use crate::error::{RetrieveError, RetrieveResult};
use crate::listing::list_series;
use crate::records::{build_records, fetch_series, own_series};
use crate::request::RetrieveRequest;
use crate::session::RetrieveSession;

/// What an eager retrieval committed.
#[derive(Clone, Debug)]
pub struct EagerReport {
    pub study: StudyUid,
    /// One per listed series, in listing order.
    pub summaries: Vec<SeriesSummary>,
    pub instance_count: usize,
}

pub(crate) async fn retrieve(session: &RetrieveSession, request: &RetrieveRequest) -> RetrieveResult<EagerReport> {
    let study = request.study()?.clone();
    let session = &session.for_request(request);
    let limit = session.concurrency_limit(request)?;
    let store = session.store();
    let epoch = store.epoch(&study);
    debug!(%study, epoch, credentialed = ?request.allow_credentialed_requests, "eager retrieval started");

    let listing = list_series(session, &study, request).await?;
    let mut fetches = Vec::with_capacity(listing.len());
    for summary in &listing {
        fetches.push(fetch_series(session, &study, &summary.series, limit.as_ref()));
    }
    let fetched = try_join_all(fetches).await?;

    let mapper = request.range_mapper.as_deref();
    let mut records: Vec<InstanceRecord> = Vec::new();
    for (summary, wire) in listing.iter().zip(&fetched) {
        let built = build_records(session, &study, &summary.series, wire, mapper)?;
        records.extend(own_series(&summary.series, built));
    }
    let (summaries, records) = group_by_series(listing, records);

    if !store.commit_if_current(&study, epoch, &summaries, &records, request.made_locally)? {
        return Err(RetrieveError::Superseded(study));
    }
    if !store.mark_loaded_if_current(&study, epoch)? {
        return Err(RetrieveError::Superseded(study));
    }
    info!(%study, series = summaries.len(), instances = records.len(), "eager retrieval committed");
    Ok(EagerReport {
        study,
        summaries,
        instance_count: records.len(),
    })
}

/// Order records by listed series and derive each summary from the first
/// instance of its series. A series that came back empty keeps its listing
/// summary. Records naming an unlisted series are dropped.
fn group_by_series(
    listing: Vec<SeriesSummary>,
    records: Vec<InstanceRecord>,
) -> (Vec<SeriesSummary>, Vec<InstanceRecord>) {
    let mut groups: Vec<(SeriesSummary, Vec<InstanceRecord>)> =
        listing.into_iter().map(|summary| (summary, Vec::new())).collect();
    for record in records {
        match groups.iter_mut().find(|(summary, _)| &summary.series == record.series()) {
            Some((_, group)) => group.push(record),
            None => warn!(series = %record.series(), sop = %record.sop(), "instance of an unlisted series dropped"),
        }
    }

    let mut summaries = Vec::with_capacity(groups.len());
    let mut ordered = Vec::new();
    for (listed, group) in groups {
        let summary = match group.first() {
            Some(first) => {
                SeriesSummary::from_dataset(listed.study.clone(), listed.series.clone(), &first.attributes)
                    .with_instance_count(group.len())
            }
            None => listed.with_instance_count(0),
        };
        summaries.push(summary);
        ordered.extend(group);
    }
    (summaries, ordered)
}
