//! Transport adapters for the DICOMweb loader.
//!
//! Every backend implements [`MetadataTransport`], the contract the
//! retrieval orchestrator is written against:
//!
//! - [`DicomWebTransport`] -- a live QIDO-RS / WADO-RS / STOW-RS server
//! - [`StaticWadoTransport`] -- a precomputed static snapshot served as
//!   plain JSON files; read-only, delivers series metadata progressively
//! - [`InMemoryTransport`] -- map-backed backend for tests and embedding
//!
//! Authorization headers come from an [`AuthHeaderProvider`] queried on
//! every request, so a refreshed token is picked up by the next call
//! without rebuilding the adapter.

pub mod auth;
pub mod config;
pub mod dicomweb;
pub mod endpoint;
pub mod error;
mod http;
pub mod memory;
pub mod multipart;
pub mod static_wado;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_server;

pub use auth::{AuthHeaderProvider, NoAuth, StaticAuthHeaders};
pub use config::HttpTransportConfig;
pub use dicomweb::DicomWebTransport;
pub use endpoint::{endpoints, media_types};
pub use error::{TransportError, TransportResult};
pub use memory::InMemoryTransport;
pub use static_wado::StaticWadoTransport;
pub use traits::{MetadataTransport, PendingInstances, SeriesDelivery};
