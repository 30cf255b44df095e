use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use dwl_types::{SeriesUid, StudyUid, WireDataset};

use crate::error::TransportResult;

/// Remaining instance records of a progressively delivered series.
pub type PendingInstances = BoxFuture<'static, TransportResult<Vec<WireDataset>>>;

/// Result of a series metadata request.
pub enum SeriesDelivery {
    /// The full instance list.
    Complete(Vec<WireDataset>),
    /// A small eagerly available subset plus the rest still in flight.
    Progressive {
        head: Vec<WireDataset>,
        rest: PendingInstances,
    },
}

impl SeriesDelivery {
    /// Records available without further waiting.
    pub fn head(&self) -> &[WireDataset] {
        match self {
            Self::Complete(all) => all,
            Self::Progressive { head, .. } => head,
        }
    }

    pub fn is_progressive(&self) -> bool {
        matches!(self, Self::Progressive { .. })
    }

    /// Wait for every record. Head records come first, in delivery order.
    pub async fn collect(self) -> TransportResult<Vec<WireDataset>> {
        match self {
            Self::Complete(all) => Ok(all),
            Self::Progressive { mut head, rest } => {
                head.extend(rest.await?);
                Ok(head)
            }
        }
    }
}

impl fmt::Debug for SeriesDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(all) => f.debug_tuple("Complete").field(&all.len()).finish(),
            Self::Progressive { head, .. } => f
                .debug_struct("Progressive")
                .field("head", &head.len())
                .finish_non_exhaustive(),
        }
    }
}

/// Query and retrieve contract against a metadata/content endpoint.
///
/// Implementations must be cheap to share behind an `Arc`; the orchestrator
/// issues concurrent calls against one instance.
#[async_trait]
pub trait MetadataTransport: Send + Sync {
    /// Short backend label used in logs and errors.
    fn name(&self) -> &'static str;

    /// Study-level series listing: one record per series, no instances.
    async fn search_series(&self, study: &StudyUid) -> TransportResult<Vec<WireDataset>>;

    /// Instance records of one series.
    async fn retrieve_series_metadata(
        &self,
        study: &StudyUid,
        series: &SeriesUid,
    ) -> TransportResult<SeriesDelivery>;

    /// Value of an externally stored attribute. `study` scopes relative URIs.
    async fn retrieve_bulk_data(&self, uri: &str, study: &StudyUid) -> TransportResult<Bytes>;

    /// Write instance records to the server.
    async fn store_instances(&self, datasets: &[WireDataset]) -> TransportResult<()>;

    /// A view of this backend that attaches no credentials to its requests.
    /// `None` for backends that never send any.
    fn without_credentials(&self) -> Option<Arc<dyn MetadataTransport>> {
        None
    }
}
