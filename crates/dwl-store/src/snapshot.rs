use serde::{Deserialize, Serialize};

use dwl_types::{InstanceRecord, SeriesSummary, StudyUid};

/// Point-in-time copy of one series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    pub summary: SeriesSummary,
    pub instances: Vec<InstanceRecord>,
    pub made_locally: bool,
}

impl SeriesSnapshot {
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

/// Point-in-time copy of one study, series in arrival order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudySnapshot {
    pub study: StudyUid,
    pub loaded: bool,
    pub epoch: u64,
    pub series: Vec<SeriesSnapshot>,
}

impl StudySnapshot {
    pub fn instance_count(&self) -> usize {
        self.series.iter().map(SeriesSnapshot::instance_count).sum()
    }

    /// Number of series cached for the study.
    pub fn series_count(&self) -> usize {
        self.series.len()
    }
}
