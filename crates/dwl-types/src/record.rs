use std::fmt;

use serde::{Deserialize, Serialize};

use crate::natural::NaturalDataset;
use crate::tags::keywords;
use crate::uid::{InstanceKey, SeriesUid, SopUid, StudyUid};

/// Opaque addressing token for one frame of one instance.
///
/// Consumers hand it back to the pixel loader unchanged; nothing in DWL
/// parses it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptive fields of one series, shown before its instances arrive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub study: StudyUid,
    pub series: SeriesUid,
    pub description: Option<String>,
    pub modality: Option<String>,
    pub series_number: Option<i64>,
    pub series_date: Option<String>,
    pub series_time: Option<String>,
    pub acquisition_time: Option<String>,
    pub protocol_name: Option<String>,
    /// Instance count, from the listing's `NumberOfSeriesRelatedInstances`
    /// or from the retrieved instance set.
    pub instance_count: Option<usize>,
}

impl SeriesSummary {
    /// Summary with identifiers only.
    pub fn new(study: StudyUid, series: SeriesUid) -> Self {
        Self {
            study,
            series,
            description: None,
            modality: None,
            series_number: None,
            series_date: None,
            series_time: None,
            acquisition_time: None,
            protocol_name: None,
            instance_count: None,
        }
    }

    /// Read the summary fields out of a naturalized dataset, either a
    /// series-level query result or the first instance of the series.
    pub fn from_dataset(study: StudyUid, series: SeriesUid, dataset: &NaturalDataset) -> Self {
        let text = |keyword: &str| dataset.get_str(keyword).map(str::to_string);
        Self {
            description: text(keywords::SERIES_DESCRIPTION),
            modality: text(keywords::MODALITY),
            series_number: dataset.get_i64(keywords::SERIES_NUMBER),
            series_date: text(keywords::SERIES_DATE),
            series_time: text(keywords::SERIES_TIME),
            acquisition_time: text(keywords::ACQUISITION_TIME),
            protocol_name: text(keywords::PROTOCOL_NAME),
            instance_count: dataset
                .get_i64(keywords::NUMBER_OF_SERIES_RELATED_INSTANCES)
                .and_then(|n| usize::try_from(n).ok()),
            ..Self::new(study, series)
        }
    }

    /// Replace the instance count.
    pub fn with_instance_count(mut self, count: usize) -> Self {
        self.instance_count = Some(count);
        self
    }
}

/// One instance as committed to the cache: its naturalized attributes plus
/// the image identifiers assigned before commit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub key: InstanceKey,
    pub attributes: NaturalDataset,
    /// One id for single-frame instances, one per frame otherwise.
    pub image_ids: Vec<ImageId>,
    pub frame_count: u32,
}

impl InstanceRecord {
    pub fn study(&self) -> &StudyUid {
        &self.key.study
    }

    pub fn series(&self) -> &SeriesUid {
        &self.key.series
    }

    pub fn sop(&self) -> &SopUid {
        &self.key.sop
    }

    /// More than one frame.
    pub fn is_multiframe(&self) -> bool {
        self.frame_count > 1
    }

    pub fn instance_number(&self) -> Option<i64> {
        self.attributes.get_i64(keywords::INSTANCE_NUMBER)
    }
}
