use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use dwl_types::{SeriesUid, StudyUid, WireDataset};

use crate::auth::AuthHeaderProvider;
use crate::config::HttpTransportConfig;
use crate::endpoint::{endpoints, media_types};
use crate::error::{TransportError, TransportResult};
use crate::http::HttpClient;
use crate::multipart;
use crate::traits::{MetadataTransport, SeriesDelivery};

const STOW_BOUNDARY: &str = "dwl-stow-boundary";

/// Live DICOMweb server: QIDO-RS search, WADO-RS metadata and bulk data,
/// STOW-RS store.
pub struct DicomWebTransport {
    config: HttpTransportConfig,
    http: HttpClient,
}

impl DicomWebTransport {
    /// Validate `config` and build the HTTP client.
    pub fn new(config: HttpTransportConfig, auth: Arc<dyn AuthHeaderProvider>) -> TransportResult<Self> {
        let config = config.validated()?;
        let http = HttpClient::new(&config, auth)?;
        Ok(Self { config, http })
    }

    /// The validated configuration.
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }
}

#[async_trait]
impl MetadataTransport for DicomWebTransport {
    fn name(&self) -> &'static str {
        "dicomweb"
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
        let series = self.http.get_datasets(&url, media_types::DICOM_JSON).await?;
        debug!(%study, count = series.len(), "series search complete");
        Ok(series)
    }

    async fn retrieve_series_metadata(
        &self,
        study: &StudyUid,
        series: &SeriesUid,
    ) -> TransportResult<SeriesDelivery> {
        let url = endpoints::series_metadata(&self.config.wado_root, study, series);
        let instances = self.http.get_datasets(&url, media_types::DICOM_JSON).await?;
        debug!(%study, %series, count = instances.len(), "series metadata retrieved");
        Ok(SeriesDelivery::Complete(instances))
    }

    async fn retrieve_bulk_data(&self, uri: &str, study: &StudyUid) -> TransportResult<Bytes> {
        let url = endpoints::bulk_data(&self.config.wado_root, study, uri);
        let payload = self.http.get(&url, media_types::MULTIPART_OCTET_STREAM).await?;
        multipart::first_part(payload.content_type.as_deref(), payload.body)
    }

    async fn store_instances(&self, datasets: &[WireDataset]) -> TransportResult<()> {
        let json = serde_json::to_vec(datasets).map_err(|e| TransportError::Decode(e.to_string()))?;
        let body = multipart::encode_related(&[(media_types::DICOM_JSON, json.as_slice())], STOW_BOUNDARY);
        let content_type = format!(
            "multipart/related; type=\"{}\"; boundary={STOW_BOUNDARY}",
            media_types::DICOM_JSON
        );
        let url = endpoints::studies(&self.config.wado_root);
        self.http.post(&url, &content_type, body).await?;
        debug!(count = datasets.len(), "instances stored");
        Ok(())
    }
}
