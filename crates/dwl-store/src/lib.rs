//! Metadata cache for retrieved studies.
//!
//! The retrieval pipeline writes series summaries and instance records into
//! a [`MetadataStore`]; the rendering layer reads them back. Records are
//! keyed by their DICOM identifiers and every write is an upsert, so running
//! a retrieval twice never duplicates anything.
//!
//! # Study lifecycle
//!
//! - Summaries and instances arrive in any order; series keep arrival order.
//! - [`MetadataStore::mark_loaded`] flips a study to loaded. Only
//!   [`MetadataStore::begin_reload`] flips it back, by dropping the study.
//! - Each study carries an epoch that `begin_reload` advances. Writers that
//!   captured an older epoch have their commits refused.

pub mod error;
pub mod memory;
pub mod snapshot;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryMetadataStore;
pub use snapshot::{SeriesSnapshot, StudySnapshot};
pub use traits::MetadataStore;
