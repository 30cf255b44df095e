//! Bulk data handling for naturalized instance records.
//!
//! Large attribute values (pixel data, waveforms, encapsulated documents) are
//! not shipped inline with the metadata. The server hands out a
//! `BulkDataURI` instead, which naturalization turns into an unresolved
//! [`BulkDataRef`](dwl_types::BulkDataRef).
//!
//! This crate does two things with those references:
//!
//! - [`BulkDataResolver::attach`] rewrites relative URIs into absolute ones
//!   once the owning study and series are known;
//! - [`BulkDataResolver::resolve`] fetches a value on first access and
//!   memoizes it per `(uri, study)`.
//!
//! A resolved reference never goes back to unresolved.

pub mod config;
pub mod error;
pub mod resolver;

pub use config::{BulkDataUriConfig, RelativeResolution};
pub use error::{BulkDataError, BulkDataResult};
pub use resolver::{BulkDataContext, BulkDataResolver};
