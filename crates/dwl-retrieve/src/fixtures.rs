//! Shared test study: "1.2.3" with a five-instance CT series `S1` and an
//! SR series `S2` the transport rejects.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dwl_store::{InMemoryMetadataStore, MetadataStore, StoreResult, StudySnapshot};
use dwl_transport::InMemoryTransport;
use dwl_types::{tags, InstanceRecord, SeriesSummary, SeriesUid, StudyUid, WireAttribute, WireDataset};

use crate::config::DataSourceConfig;
use crate::session::RetrieveSession;

pub const STUDY: &str = "1.2.3";
pub const ROOT: &str = "http://pacs.test/dicom-web";

pub fn listing(series: &str, modality: &str, number: i64, count: i64) -> WireDataset {
    WireDataset::new()
        .with_string(tags::STUDY_INSTANCE_UID, "UI", STUDY)
        .with_string(tags::SERIES_INSTANCE_UID, "UI", series)
        .with_string(tags::MODALITY, "CS", modality)
        .with_string(tags::SERIES_DESCRIPTION, "LO", &format!("listed {series}"))
        .with_number(tags::SERIES_NUMBER, "IS", number)
        .with_number(tags::NUMBER_OF_SERIES_RELATED_INSTANCES, "IS", count)
}

pub fn instance(series: &str, n: usize) -> WireDataset {
    let sop = format!("{series}.{n}");
    WireDataset::new()
        .with_string(tags::STUDY_INSTANCE_UID, "UI", STUDY)
        .with_string(tags::SERIES_INSTANCE_UID, "UI", series)
        .with_string(tags::SOP_INSTANCE_UID, "UI", &sop)
        .with_string(tags::MODALITY, "CS", "CT")
        .with_string(tags::SERIES_DESCRIPTION, "LO", &format!("instance {series}"))
        .with_number(tags::INSTANCE_NUMBER, "IS", n as i64)
        .with_attribute(tags::PIXEL_DATA, WireAttribute::bulk_data("OW", format!("bulk/{sop}")))
}

pub fn instances(series: &str, count: usize) -> Vec<WireDataset> {
    (1..=count).map(|n| instance(series, n)).collect()
}

pub fn transport() -> Arc<InMemoryTransport> {
    let transport = InMemoryTransport::new();
    transport.add_series(STUDY, "S1", listing("S1", "CT", 1, 5), instances("S1", 5));
    transport.add_series(STUDY, "S2", listing("S2", "SR", 2, 2), instances("S2", 2));
    transport.reject_series(STUDY, "S2");
    Arc::new(transport)
}

pub fn config() -> DataSourceConfig {
    DataSourceConfig {
        wado_root: ROOT.into(),
        qido_root: ROOT.into(),
        ..DataSourceConfig::default()
    }
}

pub fn session_with(config: DataSourceConfig) -> (RetrieveSession, Arc<InMemoryTransport>, Arc<InMemoryMetadataStore>) {
    session_over(config, transport())
}

pub fn session_over(
    config: DataSourceConfig,
    transport: Arc<InMemoryTransport>,
) -> (RetrieveSession, Arc<InMemoryTransport>, Arc<InMemoryMetadataStore>) {
    let store = Arc::new(InMemoryMetadataStore::new());
    let session = RetrieveSession::from_parts(&config, transport.clone(), store.clone()).unwrap();
    (session, transport, store)
}

pub fn session() -> (RetrieveSession, Arc<InMemoryTransport>, Arc<InMemoryMetadataStore>) {
    session_with(config())
}

/// In-memory store where a reload of the study lands just before the first
/// loaded mark.
#[derive(Default)]
pub struct ReloadBeforeMark {
    pub inner: InMemoryMetadataStore,
    fired: AtomicBool,
}

impl MetadataStore for ReloadBeforeMark {
    fn add_series_summaries(&self, summaries: &[SeriesSummary], made_locally: bool) -> StoreResult<()> {
        self.inner.add_series_summaries(summaries, made_locally)
    }

    fn add_instances(&self, instances: &[InstanceRecord], made_locally: bool) -> StoreResult<()> {
        self.inner.add_instances(instances, made_locally)
    }

    fn commit_if_current(
        &self,
        study: &StudyUid,
        epoch: u64,
        summaries: &[SeriesSummary],
        instances: &[InstanceRecord],
        made_locally: bool,
    ) -> StoreResult<bool> {
        self.inner.commit_if_current(study, epoch, summaries, instances, made_locally)
    }

    fn mark_loaded(&self, study: &StudyUid) -> StoreResult<()> {
        self.inner.mark_loaded(study)
    }

    fn mark_loaded_if_current(&self, study: &StudyUid, epoch: u64) -> StoreResult<bool> {
        if !self.fired.swap(true, Ordering::SeqCst) {
            self.inner.begin_reload(study);
        }
        self.inner.mark_loaded_if_current(study, epoch)
    }

    fn is_loaded(&self, study: &StudyUid) -> bool {
        self.inner.is_loaded(study)
    }

    fn epoch(&self, study: &StudyUid) -> u64 {
        self.inner.epoch(study)
    }

    fn begin_reload(&self, study: &StudyUid) -> u64 {
        self.inner.begin_reload(study)
    }

    fn study(&self, study: &StudyUid) -> Option<StudySnapshot> {
        self.inner.study(study)
    }

    fn series_summary(&self, study: &StudyUid, series: &SeriesUid) -> Option<SeriesSummary> {
        self.inner.series_summary(study, series)
    }

    fn instances(&self, study: &StudyUid, series: &SeriesUid) -> StoreResult<Vec<InstanceRecord>> {
        self.inner.instances(study, series)
    }
}
