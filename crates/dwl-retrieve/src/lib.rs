//! Study metadata retrieval for the DICOMweb loader.
//!
//! A [`RetrieveSession`] ties a transport, a metadata store, a bulk data
//! resolver and an image id synthesizer together. Callers describe what to
//! load with a [`RetrieveRequest`] and pick one of two strategies:
//!
//! - **Eager**: every series is fetched before anything is cached. Any
//!   failure fails the whole call and nothing is committed.
//! - **Lazy**: series summaries are cached and returned right away; each
//!   series is then fetched and committed on its own. A failing series is
//!   recorded in the [`BatchReport`] and does not affect the others.
//!
//! Either way the study is marked loaded once every series has finished.

pub mod config;
pub mod eager;
pub mod error;
pub mod lazy;
pub mod request;
pub mod session;

mod listing;
mod records;

#[cfg(test)]
pub(crate) mod fixtures;

pub use config::DataSourceConfig;
pub use eager::EagerReport;
pub use error::{RetrieveError, RetrieveResult, SeriesFailure};
pub use lazy::{BatchReport, LazyRetrieval, SeriesSuccess};
pub use request::{
    RetrieveRequest, SeriesFilter, SeriesSortFn, SortCriteria, SortDirection, SortKey, Strategy,
};
pub use session::{RetrieveOutcome, RetrieveSession};
