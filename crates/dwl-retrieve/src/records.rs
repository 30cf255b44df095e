use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use dwl_bulkdata::BulkDataContext;
use dwl_imageid::{frame_count, FrameRangeMapper};
use dwl_naturalize::naturalize;
use dwl_types::tags::keywords;
use dwl_types::{InstanceKey, InstanceRecord, SeriesUid, SopUid, StudyUid, WireDataset};

use crate::error::{RetrieveError, RetrieveResult};
use crate::session::RetrieveSession;

/// Turn the wire records of one series into cache records: naturalize,
/// attach bulk data, assign image ids.
///
/// An instance names its own series when it carries `SeriesInstanceUID`;
/// otherwise it belongs to `series`.
pub(crate) fn build_records(
    session: &RetrieveSession,
    study: &StudyUid,
    series: &SeriesUid,
    wire: &[WireDataset],
    mapper: Option<&dyn FrameRangeMapper>,
) -> RetrieveResult<Vec<InstanceRecord>> {
    wire.iter()
        .map(|record| {
            let mut attributes = naturalize(record);
            let sop = attributes
                .get_str(keywords::SOP_INSTANCE_UID)
                .map(SopUid::new)
                .filter(|uid| !uid.is_empty())
                .ok_or(RetrieveError::MissingIdentifier("SOPInstanceUID"))?;
            let series = attributes
                .get_str(keywords::SERIES_INSTANCE_UID)
                .map(SeriesUid::new)
                .filter(|uid| !uid.is_empty())
                .unwrap_or_else(|| series.clone());
            let key = InstanceKey {
                study: study.clone(),
                series,
                sop,
            };

            let ctx = BulkDataContext {
                wado_root: session.wado_root(),
                study: &key.study,
                series: &key.series,
            };
            session.bulk_data().attach(&mut attributes, &ctx);

            let frames = frame_count(&attributes);
            let image_ids = session.image_ids().image_ids(&key, frames, mapper)?;
            Ok(InstanceRecord {
                key,
                attributes,
                image_ids,
                frame_count: frames.unwrap_or(1).max(1),
            })
        })
        .collect()
}

/// Keep the records that belong to `series`. A series' metadata can name
/// other series; those records are dropped so a fetch only ever writes to
/// the series it was issued for.
pub(crate) fn own_series(series: &SeriesUid, mut records: Vec<InstanceRecord>) -> Vec<InstanceRecord> {
    records.retain(|record| {
        let own = record.series() == series;
        if !own {
            warn!(%series, other = %record.series(), sop = %record.sop(), "instance of another series dropped");
        }
        own
    });
    records
}

/// Every instance record of one series, waiting for a permit first when
/// fetches are capped.
pub(crate) async fn fetch_series(
    session: &RetrieveSession,
    study: &StudyUid,
    series: &SeriesUid,
    limit: Option<&Arc<Semaphore>>,
) -> RetrieveResult<Vec<WireDataset>> {
    let _permit = match limit {
        Some(semaphore) => Some(
            semaphore
                .acquire()
                .await
                .map_err(|e| RetrieveError::Join(e.to_string()))?,
        ),
        None => None,
    };
    let delivery = session.transport().retrieve_series_metadata(study, series).await?;
    debug!(%study, %series, head = delivery.head().len(), progressive = delivery.is_progressive(), "series metadata received");
    Ok(delivery.collect().await?)
}
