//! Foundation types for the DICOMweb loader (DWL).
//!
//! This crate provides the identifier, dataset, and record types shared by
//! every other DWL crate. It performs no I/O.
//!
//! # Key Types
//!
//! - [`StudyUid`], [`SeriesUid`], [`SopUid`]: scoped DICOM identifiers
//! - [`InstanceKey`]: the (study, series, SOP) triple addressing one instance
//! - [`WireDataset`]: tag-keyed DICOM JSON dictionary as received on the wire
//! - [`NaturalDataset`]: keyword-keyed record produced by naturalization
//! - [`AttributeValue`] / [`BulkDataRef`]: attribute values, including
//!   deferred bulk data references
//! - [`SeriesSummary`] / [`InstanceRecord`]: records committed to the cache
//! - [`ImageId`]: opaque per-frame addressing token

pub mod error;
pub mod natural;
pub mod record;
pub mod tags;
pub mod uid;
pub mod wire;

pub use error::TypeError;
pub use natural::{AttributeValue, BulkDataRef, NaturalDataset};
pub use record::{ImageId, InstanceRecord, SeriesSummary};
pub use uid::{InstanceKey, SeriesUid, SopUid, StudyUid};
pub use wire::{WireAttribute, WireDataset};
