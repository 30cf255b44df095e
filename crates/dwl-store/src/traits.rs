use dwl_types::{InstanceRecord, SeriesSummary, SeriesUid, StudyUid};

use crate::error::StoreResult;
use crate::snapshot::StudySnapshot;

/// Cache of retrieved study metadata.
///
/// Implementations must satisfy these invariants:
/// - Writes upsert by identifier: a series by `(study, series)`, an instance
///   by `(study, series, sop)`.
/// - One `add_instances` call is atomic: readers see all of it or none.
/// - `loaded` only goes from false to true, except through `begin_reload`.
/// - A study's epoch never decreases.
pub trait MetadataStore: Send + Sync {
    /// Upsert series summaries. Instances already cached for a series stay.
    fn add_series_summaries(&self, summaries: &[SeriesSummary], made_locally: bool) -> StoreResult<()>;

    /// Upsert instance records in one atomic batch. A series without a
    /// summary gets an empty one.
    fn add_instances(&self, instances: &[InstanceRecord], made_locally: bool) -> StoreResult<()>;

    /// Commit summaries then instances atomically, but only while `study`
    /// is still at `epoch`. Returns `false` when the commit was refused.
    fn commit_if_current(
        &self,
        study: &StudyUid,
        epoch: u64,
        summaries: &[SeriesSummary],
        instances: &[InstanceRecord],
        made_locally: bool,
    ) -> StoreResult<bool>;

    /// Mark `study` fully retrieved. Never cleared except by `begin_reload`.
    fn mark_loaded(&self, study: &StudyUid) -> StoreResult<()>;

    /// Mark `study` loaded, but only while it is still at `epoch`. The epoch
    /// check and the flag write are one step. Returns `false` when refused.
    fn mark_loaded_if_current(&self, study: &StudyUid, epoch: u64) -> StoreResult<bool>;

    /// Whether `study` has been marked loaded.

    fn is_loaded(&self, study: &StudyUid) -> bool;

    /// Current epoch of `study`. Unknown studies are at epoch 0.
    fn epoch(&self, study: &StudyUid) -> u64;

    /// Drop everything cached for `study` and advance its epoch. Returns the
    /// new epoch.
    fn begin_reload(&self, study: &StudyUid) -> u64;

    /// Point-in-time copy of everything cached for `study`.
    fn study(&self, study: &StudyUid) -> Option<StudySnapshot>;

    fn series_summary(&self, study: &StudyUid, series: &SeriesUid) -> Option<SeriesSummary>;

    /// Instances of one series in arrival order.
    fn instances(&self, study: &StudyUid, series: &SeriesUid) -> StoreResult<Vec<InstanceRecord>>;

    /// Total instances cached for `study`.
    fn instance_count(&self, study: &StudyUid) -> usize {
        self.study(study).map(|s| s.instance_count()).unwrap_or(0)
    }
}
