use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use tokio::sync::Notify;
use tracing::debug;

use dwl_types::{tags, SeriesUid, StudyUid, WireDataset};

use crate::error::{TransportError, TransportResult};
use crate::traits::{MetadataTransport, SeriesDelivery};

const BACKEND: &str = "memory";

struct SeriesFixture {
    series: SeriesUid,
    listing: WireDataset,
    instances: Vec<WireDataset>,
}

#[derive(Default)]
struct Inner {
    studies: HashMap<StudyUid, Vec<SeriesFixture>>,
    bulk_data: HashMap<String, Bytes>,
    rejected: HashSet<(StudyUid, SeriesUid)>,
    gates: HashMap<SeriesUid, Arc<Notify>>,
}

/// In-process transport backed by fixtures.
///
/// Series come back in insertion order. Every call yields to the scheduler
/// once so concurrent callers interleave the way they would against a real
/// server.
#[derive(Default)]
pub struct InMemoryTransport {
    inner: RwLock<Inner>,
    progressive: bool,
    search_calls: AtomicUsize,
    series_calls: AtomicUsize,
    bulk_data_calls: AtomicUsize,
}

impl InMemoryTransport {
    /// Create an empty transport with no studies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver series metadata as a first record plus a pending remainder.
    pub fn with_progressive_delivery(mut self) -> Self {
        self.progressive = true;
        self
    }

    /// Register a series. The listing record gets the study and series UIDs
    /// when it does not carry them.
    pub fn add_series(
        &self,
        study: impl Into<StudyUid>,
        series: impl Into<SeriesUid>,
        listing: WireDataset,
        instances: Vec<WireDataset>,
    ) {
        let study = study.into();
        let series = series.into();
        let mut listing = listing;
        if listing.get(tags::STUDY_INSTANCE_UID).is_none() {
            listing = listing.with_string(tags::STUDY_INSTANCE_UID, "UI", study.as_str());
        }
        if listing.get(tags::SERIES_INSTANCE_UID).is_none() {
            listing = listing.with_string(tags::SERIES_INSTANCE_UID, "UI", series.as_str());
        }
        let mut inner = self.inner.write().expect("lock poisoned");
        let entries = inner.studies.entry(study).or_default();
        match entries.iter_mut().find(|f| f.series == series) {
            Some(existing) => {
                existing.listing = listing;
                existing.instances = instances;
            }
            None => entries.push(SeriesFixture {
                series,
                listing,
                instances,
            }),
        }
    }

    /// Make metadata requests for one series fail with `Rejected`.
    pub fn reject_series(&self, study: impl Into<StudyUid>, series: impl Into<SeriesUid>) {
        self.inner
            .write()
            .expect("lock poisoned")
            .rejected
            .insert((study.into(), series.into()));
    }

    /// Serve `value` for bulk data requests to `uri`.
    pub fn put_bulk_data(&self, uri: impl Into<String>, value: impl Into<Bytes>) {
        self.inner
            .write()
            .expect("lock poisoned")
            .bulk_data
            .insert(uri.into(), value.into());
    }

    /// Hold metadata requests for `series` until the returned handle is
    /// notified.
    pub fn gate_series(&self, series: impl Into<SeriesUid>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner
            .write()
            .expect("lock poisoned")
            .gates
            .insert(series.into(), gate.clone());
        gate
    }

    /// Series searches served so far.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Series metadata requests served so far, rejected ones included.
    pub fn series_calls(&self) -> usize {
        self.series_calls.load(Ordering::SeqCst)
    }

    /// Bulk data requests served so far.
    pub fn bulk_data_calls(&self) -> usize {
        self.bulk_data_calls.load(Ordering::SeqCst)
    }

    /// Instance records currently held for a series.
    pub fn stored_instances(&self, study: &StudyUid, series: &SeriesUid) -> Vec<WireDataset> {
        let inner = self.inner.read().expect("lock poisoned");
        inner
            .studies
            .get(study)
            .and_then(|entries| entries.iter().find(|f| &f.series == series))
            .map(|f| f.instances.clone())
            .unwrap_or_default()
    }
}

fn required(dataset: &WireDataset, tag: &'static str) -> TransportResult<String> {
    dataset
        .string(tag)
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| TransportError::Decode(format!("instance record lacks {tag}")))
}

#[async_trait]
impl MetadataTransport for InMemoryTransport {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn search_series(&self, study: &StudyUid) -> TransportResult<Vec<WireDataset>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner
            .studies
            .get(study)
            .map(|entries| entries.iter().map(|f| f.listing.clone()).collect())
            .unwrap_or_default())
    }

    async fn retrieve_series_metadata(
        &self,
        study: &StudyUid,
        series: &SeriesUid,
    ) -> TransportResult<SeriesDelivery> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.inner.read().expect("lock poisoned").gates.get(series).cloned();
        if let Some(gate) = gate {
            debug!(%series, "waiting on series gate");
            gate.notified().await;
        }
        tokio::task::yield_now().await;

        let mut instances = {
            let inner = self.inner.read().expect("lock poisoned");
            if inner.rejected.contains(&(study.clone(), series.clone())) {
                return Err(TransportError::Rejected {
                    backend: BACKEND,
                    series: series.to_string(),
                });
            }
            inner
                .studies
                .get(study)
                .and_then(|entries| entries.iter().find(|f| &f.series == series))
                .map(|f| f.instances.clone())
                .ok_or_else(|| TransportError::NotFound(format!("{study}/{series}")))?
        };

        if !self.progressive || instances.len() < 2 {
            return Ok(SeriesDelivery::Complete(instances));
        }
        let rest = instances.split_off(1);
        Ok(SeriesDelivery::Progressive {
            head: instances,
            rest: async move {
                tokio::task::yield_now().await;
                Ok(rest)
            }
            .boxed(),
        })
    }

    async fn retrieve_bulk_data(&self, uri: &str, _study: &StudyUid) -> TransportResult<Bytes> {
        self.bulk_data_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let inner = self.inner.read().expect("lock poisoned");
        inner
            .bulk_data
            .get(uri)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(uri.to_string()))
    }

    async fn store_instances(&self, datasets: &[WireDataset]) -> TransportResult<()> {
        let mut keyed = Vec::with_capacity(datasets.len());
        for dataset in datasets {
            keyed.push((
                StudyUid::new(required(dataset, tags::STUDY_INSTANCE_UID)?),
                SeriesUid::new(required(dataset, tags::SERIES_INSTANCE_UID)?),
                required(dataset, tags::SOP_INSTANCE_UID)?,
                dataset,
            ));
        }
        tokio::task::yield_now().await;

        let mut inner = self.inner.write().expect("lock poisoned");
        for (study, series, sop, dataset) in keyed {
            let entries = inner.studies.entry(study.clone()).or_default();
            let index = match entries.iter().position(|f| f.series == series) {
                Some(index) => index,
                None => {
                    let mut listing = WireDataset::new()
                        .with_string(tags::STUDY_INSTANCE_UID, "UI", study.as_str())
                        .with_string(tags::SERIES_INSTANCE_UID, "UI", series.as_str());
                    if let Some(modality) = dataset.string(tags::MODALITY) {
                        listing = listing.with_string(tags::MODALITY, "CS", modality);
                    }
                    entries.push(SeriesFixture {
                        series: series.clone(),
                        listing,
                        instances: Vec::new(),
                    });
                    entries.len() - 1
                }
            };
            let instances = &mut entries[index].instances;
            match instances
                .iter_mut()
                .find(|i| i.string(tags::SOP_INSTANCE_UID) == Some(sop.as_str()))
            {
                Some(existing) => *existing = dataset.clone(),
                None => instances.push(dataset.clone()),
            }
        }
        debug!(count = datasets.len(), "stored instances in memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(study: &str, series: &str, sop: &str) -> WireDataset {
        WireDataset::new()
            .with_string(tags::STUDY_INSTANCE_UID, "UI", study)
            .with_string(tags::SERIES_INSTANCE_UID, "UI", series)
            .with_string(tags::SOP_INSTANCE_UID, "UI", sop)
    }

    fn populated() -> InMemoryTransport {
        let t = InMemoryTransport::new();
        t.add_series("1.2.3", "S1", WireDataset::new(), vec![instance("1.2.3", "S1", "a"), instance("1.2.3", "S1", "b")]);
        t.add_series("1.2.3", "S2", WireDataset::new(), vec![instance("1.2.3", "S2", "c")]);
        t
    }

    #[tokio::test]
    async fn search_lists_series_in_insertion_order() {
        let t = populated();
        let listing = t.search_series(&"1.2.3".into()).await.unwrap();
        let uids: Vec<_> = listing.iter().filter_map(|d| d.string(tags::SERIES_INSTANCE_UID)).collect();
        assert_eq!(uids, ["S1", "S2"]);
        assert_eq!(t.search_calls(), 1);
    }

    #[tokio::test]
    async fn unknown_study_has_empty_listing() {
        let t = populated();
        assert!(t.search_series(&"9.9".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_series_fails() {
        let t = populated();
        t.reject_series("1.2.3", "S2");
        let err = t.retrieve_series_metadata(&"1.2.3".into(), &"S2".into()).await.unwrap_err();
        assert!(matches!(err, TransportError::Rejected { backend: "memory", .. }));
        assert_eq!(t.series_calls(), 1);
    }

    #[tokio::test]
    async fn unknown_series_is_not_found() {
        let t = populated();
        let err = t.retrieve_series_metadata(&"1.2.3".into(), &"S9".into()).await.unwrap_err();
        assert!(matches!(err, TransportError::NotFound(_)));
    }

    #[tokio::test]
    async fn progressive_delivery_splits_head() {
        let t = populated().with_progressive_delivery();
        let delivery = t.retrieve_series_metadata(&"1.2.3".into(), &"S1".into()).await.unwrap();
        assert!(delivery.is_progressive());
        assert_eq!(delivery.head().len(), 1);
        assert_eq!(delivery.collect().await.unwrap().len(), 2);

        let single = t.retrieve_series_metadata(&"1.2.3".into(), &"S2".into()).await.unwrap();
        assert!(!single.is_progressive());
    }

    #[tokio::test]
    async fn store_upserts_by_sop() {
        let t = populated();
        let updated = instance("1.2.3", "S1", "a").with_string(tags::MODALITY, "CS", "CT");
        t.store_instances(&[updated, instance("1.2.3", "S3", "d")]).await.unwrap();

        let s1 = t.stored_instances(&"1.2.3".into(), &"S1".into());
        assert_eq!(s1.len(), 2);
        assert_eq!(s1[0].string(tags::MODALITY), Some("CT"));
        assert_eq!(t.stored_instances(&"1.2.3".into(), &"S3".into()).len(), 1);
        assert_eq!(t.search_series(&"1.2.3".into()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn store_rejects_records_without_identifiers() {
        let t = InMemoryTransport::new();
        let err = t.store_instances(&[WireDataset::new()]).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
        assert!(t.search_series(&"1.2.3".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bulk_data_lookup_counts_calls() {
        let t = InMemoryTransport::new();
        t.put_bulk_data("bulk/1", Bytes::from_static(b"xyz"));
        assert_eq!(t.retrieve_bulk_data("bulk/1", &"1.2.3".into()).await.unwrap().as_ref(), b"xyz");
        assert!(t.retrieve_bulk_data("bulk/2", &"1.2.3".into()).await.is_err());
        assert_eq!(t.bulk_data_calls(), 2);
    }

    #[tokio::test]
    async fn gated_series_waits_for_release() {
        let t = Arc::new(populated());
        let gate = t.gate_series("S1");
        let pending = {
            let t = t.clone();
            tokio::spawn(async move { t.retrieve_series_metadata(&"1.2.3".into(), &"S1".into()).await })
        };
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());
        gate.notify_one();
        let delivery = pending.await.unwrap().unwrap();
        assert_eq!(delivery.head().len(), 2);
    }
}
