use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use dwl_types::{InstanceRecord, SeriesSummary, SeriesUid, StudyUid};

use crate::error::{StoreError, StoreResult};
use crate::snapshot::{SeriesSnapshot, StudySnapshot};
use crate::traits::MetadataStore;

#[derive(Default)]
struct StudyEntry {
    loaded: bool,
    series: Vec<SeriesSnapshot>,
}

impl StudyEntry {
    fn series_mut(&mut self, study: &StudyUid, series: &SeriesUid) -> &mut SeriesSnapshot {
        let index = match self.series.iter().position(|s| &s.summary.series == series) {
            Some(index) => index,
            None => {
                self.series.push(SeriesSnapshot {
                    summary: SeriesSummary::new(study.clone(), series.clone()),
                    instances: Vec::new(),
                    made_locally: false,
                });
                self.series.len() - 1
            }
        };
        &mut self.series[index]
    }
}

#[derive(Default)]
struct Inner {
    studies: HashMap<StudyUid, StudyEntry>,
    epochs: HashMap<StudyUid, u64>,
}

impl Inner {
    fn upsert_summaries(&mut self, summaries: &[SeriesSummary], made_locally: bool) {
        for summary in summaries {
            let entry = self.studies.entry(summary.study.clone()).or_default();
            let series = entry.series_mut(&summary.study, &summary.series);
            series.summary = summary.clone();
            series.made_locally |= made_locally;
        }
    }

    fn upsert_instances(&mut self, instances: &[InstanceRecord], made_locally: bool) {
        for record in instances {
            let entry = self.studies.entry(record.study().clone()).or_default();
            let series = entry.series_mut(record.study(), record.series());
            series.made_locally |= made_locally;
            match series.instances.iter_mut().find(|i| i.sop() == record.sop()) {
                Some(existing) => *existing = record.clone(),
                None => series.instances.push(record.clone()),
            }
        }
    }

    fn epoch(&self, study: &StudyUid) -> u64 {
        self.epochs.get(study).copied().unwrap_or(0)
    }
}

/// `HashMap`-backed metadata store behind a single `RwLock`.
pub struct InMemoryMetadataStore {
    inner: RwLock<Inner>,
}

impl InMemoryMetadataStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Number of studies currently cached.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").studies.len()
    }

    /// Whether no study is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached study UIDs, sorted.
    pub fn study_uids(&self) -> Vec<StudyUid> {
        let inner = self.inner.read().expect("lock poisoned");
        let mut uids: Vec<StudyUid> = inner.studies.keys().cloned().collect();
        uids.sort();
        uids
    }
}

impl Default for InMemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn add_series_summaries(&self, summaries: &[SeriesSummary], made_locally: bool) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.upsert_summaries(summaries, made_locally);
        debug!(count = summaries.len(), "series summaries cached");
        Ok(())
    }

    fn add_instances(&self, instances: &[InstanceRecord], made_locally: bool) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.upsert_instances(instances, made_locally);
        debug!(count = instances.len(), "instances cached");
        Ok(())
    }

    fn commit_if_current(
        &self,
        study: &StudyUid,
        epoch: u64,
        summaries: &[SeriesSummary],
        instances: &[InstanceRecord],
        made_locally: bool,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.write().expect("lock poisoned");
        let current = inner.epoch(study);
        if current != epoch {
            debug!(%study, epoch, current, "stale commit refused");
            return Ok(false);
        }
        inner.upsert_summaries(summaries, made_locally);
        inner.upsert_instances(instances, made_locally);
        debug!(%study, summaries = summaries.len(), instances = instances.len(), "batch committed");
        Ok(true)
    }

    fn mark_loaded(&self, study: &StudyUid) -> StoreResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.studies.entry(study.clone()).or_default().loaded = true;
        debug!(%study, "study marked loaded");
        Ok(())
    }

    fn mark_loaded_if_current(&self, study: &StudyUid, epoch: u64) -> StoreResult<bool> {
        let mut inner = self.inner.write().expect("lock poisoned");
        let current = inner.epoch(study);
        if current != epoch {
            debug!(%study, epoch, current, "stale loaded mark refused");
            return Ok(false);
        }
        inner.studies.entry(study.clone()).or_default().loaded = true;
        debug!(%study, epoch, "study marked loaded");
        Ok(true)
    }

    fn is_loaded(&self, study: &StudyUid) -> bool {
        let inner = self.inner.read().expect("lock poisoned");
        inner.studies.get(study).map(|s| s.loaded).unwrap_or(false)
    }

    fn epoch(&self, study: &StudyUid) -> u64 {
        self.inner.read().expect("lock poisoned").epoch(study)
    }

    fn begin_reload(&self, study: &StudyUid) -> u64 {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.studies.remove(study);
        let epoch = inner.epochs.entry(study.clone()).or_insert(0);
        *epoch += 1;
        debug!(%study, epoch = *epoch, "study dropped for reload");
        *epoch
    }

    fn study(&self, study: &StudyUid) -> Option<StudySnapshot> {
        let inner = self.inner.read().expect("lock poisoned");
        let epoch = inner.epoch(study);
        inner.studies.get(study).map(|entry| StudySnapshot {
            study: study.clone(),
            loaded: entry.loaded,
            epoch,
            series: entry.series.clone(),
        })
    }

    fn series_summary(&self, study: &StudyUid, series: &SeriesUid) -> Option<SeriesSummary> {
        let inner = self.inner.read().expect("lock poisoned");
        inner
            .studies
            .get(study)?
            .series
            .iter()
            .find(|s| &s.summary.series == series)
            .map(|s| s.summary.clone())
    }

    fn instances(&self, study: &StudyUid, series: &SeriesUid) -> StoreResult<Vec<InstanceRecord>> {
        let inner = self.inner.read().expect("lock poisoned");
        let entry = inner
            .studies
            .get(study)
            .ok_or_else(|| StoreError::UnknownStudy(study.clone()))?;
        entry
            .series
            .iter()
            .find(|s| &s.summary.series == series)
            .map(|s| s.instances.clone())
            .ok_or_else(|| StoreError::UnknownSeries {
                study: study.clone(),
                series: series.clone(),
            })
    }

    fn instance_count(&self, study: &StudyUid) -> usize {
        let inner = self.inner.read().expect("lock poisoned");
        inner
            .studies
            .get(study)
            .map(|entry| entry.series.iter().map(|s| s.instances.len()).sum())
            .unwrap_or(0)
    }
}
