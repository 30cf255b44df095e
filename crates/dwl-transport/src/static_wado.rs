use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use serde_json::Value;
use tracing::debug;

use dwl_types::{SeriesUid, StudyUid, WireDataset};

use crate::auth::AuthHeaderProvider;
use crate::config::HttpTransportConfig;
use crate::endpoint::{endpoints, media_types};
use crate::error::{TransportError, TransportResult};
use crate::http::HttpClient;
use crate::multipart;
use crate::traits::{MetadataTransport, SeriesDelivery};

const BACKEND: &str = "static-wado";

/// Precomputed static snapshot of a DICOMweb tree.
///
/// Series listings and metadata documents are plain JSON files at the
/// DICOMweb paths. The snapshot is read-only. Series metadata is delivered
/// progressively: the first instance is decoded up front and the remainder
/// is decoded when the caller awaits it.
pub struct StaticWadoTransport {
    config: HttpTransportConfig,
    http: HttpClient,
}

impl StaticWadoTransport {
    /// Validate `config` and build the HTTP client.
    pub fn new(config: HttpTransportConfig, auth: Arc<dyn AuthHeaderProvider>) -> TransportResult<Self> {
        let config = config.validated()?;
        let http = HttpClient::new(&config, auth)?;
        Ok(Self { config, http })
    }
}

fn decode_all(values: Vec<Value>) -> TransportResult<Vec<WireDataset>> {
    values
        .iter()
        .map(|v| WireDataset::from_json_value(v).map_err(TransportError::from))
        .collect()
}

#[async_trait]
impl MetadataTransport for StaticWadoTransport {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn without_credentials(&self) -> Option<Arc<dyn MetadataTransport>> {
        let mut config = self.config.clone();
        config.allow_credentialed_requests = false;
        Some(Arc::new(Self {
            config,
            http: self.http.without_credentials(),
        }))
    }

    async fn search_series(&self, study: &StudyUid) -> TransportResult<Vec<WireDataset>> {
        let url = endpoints::study_series(&self.config.qido_root, study);
        self.http.get_datasets(&url, media_types::JSON).await
    }

    async fn retrieve_series_metadata(
        &self,
        study: &StudyUid,
        series: &SeriesUid,
    ) -> TransportResult<SeriesDelivery> {
        let url = endpoints::series_metadata(&self.config.wado_root, study, series);
        let payload = self.http.get(&url, media_types::JSON).await?;
        let mut values: Vec<Value> =
            serde_json::from_slice(&payload.body).map_err(|e| TransportError::Decode(e.to_string()))?;
        if values.is_empty() {
            return Ok(SeriesDelivery::Complete(Vec::new()));
        }
        let remainder = values.split_off(1);
        let head = decode_all(values)?;
        debug!(%study, %series, remaining = remainder.len(), "static metadata head decoded");
        Ok(SeriesDelivery::Progressive {
            head,
            rest: async move { decode_all(remainder) }.boxed(),
        })
    }

    async fn retrieve_bulk_data(&self, uri: &str, study: &StudyUid) -> TransportResult<Bytes> {
        let url = endpoints::bulk_data(&self.config.wado_root, study, uri);
        let payload = self.http.get(&url, media_types::OCTET_STREAM).await?;
        multipart::first_part(payload.content_type.as_deref(), payload.body)
    }

    async fn store_instances(&self, _datasets: &[WireDataset]) -> TransportResult<()> {
        Err(TransportError::UnsupportedOperation {
            backend: BACKEND,
            operation: "store_instances",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoAuth;
    use crate::test_server;
    use dwl_types::tags;

    async fn transport() -> (StaticWadoTransport, test_server::Fixture) {
        let fixture = test_server::spawn().await;
        let t = StaticWadoTransport::new(HttpTransportConfig::with_root(&fixture.root), Arc::new(NoAuth)).unwrap();
        (t, fixture)
    }

    #[tokio::test]
    async fn metadata_is_delivered_progressively() {
        let (t, _f) = transport().await;
        let delivery = t.retrieve_series_metadata(&"1.2.3".into(), &"S1".into()).await.unwrap();
        assert!(delivery.is_progressive());
        assert_eq!(delivery.head().len(), 1);
        let all = delivery.collect().await.unwrap();
        let sops: Vec<_> = all.iter().filter_map(|d| d.string(tags::SOP_INSTANCE_UID)).collect();
        assert_eq!(sops, ["S1.1", "S1.2", "S1.3"]);
    }

    #[tokio::test]
    async fn search_series_reads_listing() {
        let (t, _f) = transport().await;
        assert_eq!(t.search_series(&"1.2.3".into()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn store_is_unsupported() {
        let (t, f) = transport().await;
        let err = t.store_instances(&[WireDataset::new()]).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::UnsupportedOperation { backend: "static-wado", operation: "store_instances" }
        ));
        assert!(f.stored_bodies().is_empty());
    }

    #[tokio::test]
    async fn bulk_data_is_readable() {
        let (t, _f) = transport().await;
        let value = t.retrieve_bulk_data("bulk/pixel", &"1.2.3".into()).await.unwrap();
        assert_eq!(value.as_ref(), test_server::BULK_VALUE);
    }

    #[test]
    fn decode_all_rejects_non_objects() {
        assert!(decode_all(vec![Value::from(1)]).is_err());
    }
}
