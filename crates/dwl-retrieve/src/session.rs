use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info};

use dwl_bulkdata::BulkDataResolver;
use dwl_imageid::ImageIdSynthesizer;
use dwl_store::MetadataStore;
use dwl_transport::{AuthHeaderProvider, DicomWebTransport, MetadataTransport, StaticWadoTransport};
use dwl_types::SeriesSummary;

use crate::config::DataSourceConfig;
use crate::eager::{self, EagerReport};
use crate::error::{RetrieveError, RetrieveResult};
use crate::lazy::{self, LazyRetrieval};
use crate::request::{RetrieveRequest, Strategy};

/// Everything a retrieval needs, shared cheaply across tasks.
#[derive(Clone)]
pub struct RetrieveSession {
    name: Arc<str>,
    wado_root: Arc<str>,
    transport: Arc<dyn MetadataTransport>,
    store: Arc<dyn MetadataStore>,
    bulk_data: Arc<BulkDataResolver>,
    image_ids: Arc<ImageIdSynthesizer>,
    default_strategy: Strategy,
    max_concurrent_series: Option<usize>,
}

/// Result of [`RetrieveSession::retrieve`].
pub enum RetrieveOutcome {
    Eager(EagerReport),
    Lazy(LazyRetrieval),
}

impl RetrieveOutcome {
    /// Strategy that produced this outcome.
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Eager(_) => Strategy::Eager,
            Self::Lazy(_) => Strategy::Lazy,
        }
    }

    /// Series summaries known when the call returned.
    pub fn summaries(&self) -> &[SeriesSummary] {
        match self {
            Self::Eager(report) => &report.summaries,
            Self::Lazy(retrieval) => retrieval.summaries(),
        }
    }
}

impl RetrieveSession {
    /// Build the HTTP backend the configuration names.
    pub fn from_config(
        config: DataSourceConfig,
        auth: Arc<dyn AuthHeaderProvider>,
        store: Arc<dyn MetadataStore>,
    ) -> RetrieveResult<Self> {
        let config = config.validated()?;
        let transport: Arc<dyn MetadataTransport> = if config.static_wado {
            Arc::new(StaticWadoTransport::new(config.http_config(), auth)?)
        } else {
            Arc::new(DicomWebTransport::new(config.http_config(), auth)?)
        };
        Self::from_parts(&config, transport, store)
    }

    /// Use an existing transport and store.
    pub fn from_parts(
        config: &DataSourceConfig,
        transport: Arc<dyn MetadataTransport>,
        store: Arc<dyn MetadataStore>,
    ) -> RetrieveResult<Self> {
        let config = config.clone().validated()?;
        debug!(source = %config.name, backend = transport.name(), "retrieve session created");
        Ok(Self {
            name: config.name.as_str().into(),
            wado_root: config.wado_root.as_str().into(),
            bulk_data: Arc::new(BulkDataResolver::new(transport.clone(), config.bulk_data.clone())),
            image_ids: Arc::new(ImageIdSynthesizer::new(config.image_id_config())),
            transport,
            store,
            default_strategy: config.default_strategy(),
            max_concurrent_series: config.max_concurrent_series,
        })
    }

    /// Data source name from the configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root relative bulk data URIs resolve against.
    pub fn wado_root(&self) -> &str {
        &self.wado_root
    }

    /// Backend the session fetches through.
    pub fn transport(&self) -> &Arc<dyn MetadataTransport> {
        &self.transport
    }

    /// Cache the session commits to.
    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    /// Shared bulk data resolver and its cache.
    pub fn bulk_data(&self) -> &BulkDataResolver {
        &self.bulk_data
    }

    /// Image id synthesizer for this data source.
    pub fn image_ids(&self) -> &ImageIdSynthesizer {
        &self.image_ids
    }

    /// Strategy used when the request does not pick one.
    pub fn default_strategy(&self) -> Strategy {
        self.default_strategy
    }

    /// Load a study with the request's strategy, or the data source default.
    pub async fn retrieve(&self, request: &RetrieveRequest) -> RetrieveResult<RetrieveOutcome> {
        let strategy = request.strategy.unwrap_or(self.default_strategy);
        match strategy {
            Strategy::Eager => Ok(RetrieveOutcome::Eager(self.retrieve_eager(request).await?)),
            Strategy::Lazy => Ok(RetrieveOutcome::Lazy(self.retrieve_lazy(request).await?)),
        }
    }

    /// Load every series, then commit the study in one batch.
    pub async fn retrieve_eager(&self, request: &RetrieveRequest) -> RetrieveResult<EagerReport> {
        eager::retrieve(self, request).await
    }

    /// Commit summaries now and load each series in the background.
    pub async fn retrieve_lazy(&self, request: &RetrieveRequest) -> RetrieveResult<LazyRetrieval> {
        lazy::retrieve(self, request).await
    }

    /// Drop the cached study, then load it again. Work still in flight from
    /// an earlier retrieval of the same study is discarded.
    pub async fn reload(&self, request: &RetrieveRequest) -> RetrieveResult<RetrieveOutcome> {
        let study = request.study()?;
        let epoch = self.store.begin_reload(study);
        info!(%study, epoch, "study reload started");
        self.retrieve(request).await
    }

    /// This session as one request sees it. A request that disallows
    /// credentials fetches through a credential-free view of the transport.
    pub(crate) fn for_request(&self, request: &RetrieveRequest) -> Self {
        if request.allow_credentialed_requests != Some(false) {
            return self.clone();
        }
        match self.transport.without_credentials() {
            Some(transport) => {
                debug!(source = %self.name, "credentials withheld for this retrieval");
                Self {
                    transport,
                    ..self.clone()
                }
            }
            None => self.clone(),
        }
    }

    /// Fetch cap for one retrieval: the request's, else the data source's.
    pub(crate) fn concurrency_limit(&self, request: &RetrieveRequest) -> RetrieveResult<Option<Arc<Semaphore>>> {
        match request.max_concurrent_series.or(self.max_concurrent_series) {
            Some(0) => Err(RetrieveError::Configuration("max_concurrent_series must be positive".into())),
            Some(limit) => Ok(Some(Arc::new(Semaphore::new(limit)))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use dwl_store::InMemoryMetadataStore;
    use dwl_transport::NoAuth;

    #[tokio::test]
    async fn missing_study_fails_before_io() {
        let (session, transport, _store) = fixtures::session();
        for strategy in [Strategy::Eager, Strategy::Lazy] {
            let request = RetrieveRequest::default().with_strategy(strategy);
            let err = session.retrieve(&request).await.err().unwrap();
            assert!(matches!(err, RetrieveError::Configuration(_)));
        }
        assert_eq!(transport.search_calls(), 0);
        assert_eq!(transport.series_calls(), 0);
    }

    #[tokio::test]
    async fn zero_concurrency_fails_before_io() {
        let (session, transport, _store) = fixtures::session();
        let request = RetrieveRequest::new(fixtures::STUDY).with_max_concurrent_series(0);
        assert!(matches!(session.retrieve(&request).await, Err(RetrieveError::Configuration(_))));
        assert_eq!(transport.search_calls(), 0);
    }

    #[tokio::test]
    async fn default_strategy_follows_config() {
        let (session, _transport, _store) = fixtures::session();
        let outcome = session.retrieve(&RetrieveRequest::new(fixtures::STUDY)).await.unwrap();
        assert_eq!(outcome.strategy(), Strategy::Lazy);
        assert_eq!(outcome.summaries().len(), 2);
        if let RetrieveOutcome::Lazy(retrieval) = outcome {
            retrieval.completion().await.unwrap();
        }

        let config = DataSourceConfig {
            lazy_load: false,
            ..DataSourceConfig::default()
        };
        let (session, _transport, _store) = fixtures::session_with(config);
        let outcome = session.retrieve(&RetrieveRequest::new(fixtures::STUDY)).await;
        assert!(matches!(outcome, Err(RetrieveError::Transport(_))));
    }

    #[tokio::test]
    async fn from_config_picks_backend() {
        let store: Arc<dyn MetadataStore> = Arc::new(InMemoryMetadataStore::new());
        let session = RetrieveSession::from_config(DataSourceConfig::default(), Arc::new(NoAuth), store.clone()).unwrap();
        assert_eq!(session.transport().name(), "dicomweb");

        let config = DataSourceConfig {
            static_wado: true,
            ..DataSourceConfig::default()
        };
        let session = RetrieveSession::from_config(config, Arc::new(NoAuth), store).unwrap();
        assert_eq!(session.transport().name(), "static-wado");
    }

    #[test]
    fn from_config_rejects_bad_roots() {
        let config = DataSourceConfig {
            qido_root: "::".into(),
            ..DataSourceConfig::default()
        };
        let store: Arc<dyn MetadataStore> = Arc::new(InMemoryMetadataStore::new());
        assert!(matches!(
            RetrieveSession::from_config(config, Arc::new(NoAuth), store),
            Err(RetrieveError::Configuration(_))
        ));
    }

    /// Transport that records, per metadata call, whether it was made with
    /// credentials.
    struct Recording {
        inner: Arc<dwl_transport::InMemoryTransport>,
        credentialed: bool,
        calls: Arc<std::sync::Mutex<Vec<bool>>>,
    }

    impl Recording {
        fn record(&self) {
            self.calls.lock().unwrap().push(self.credentialed);
        }
    }

    #[async_trait::async_trait]
    impl MetadataTransport for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn search_series(&self, study: &dwl_types::StudyUid) -> dwl_transport::TransportResult<Vec<dwl_types::WireDataset>> {
            self.record();
            self.inner.search_series(study).await
        }

        async fn retrieve_series_metadata(
            &self,
            study: &dwl_types::StudyUid,
            series: &dwl_types::SeriesUid,
        ) -> dwl_transport::TransportResult<dwl_transport::SeriesDelivery> {
            self.record();
            self.inner.retrieve_series_metadata(study, series).await
        }

        async fn retrieve_bulk_data(
            &self,
            uri: &str,
            study: &dwl_types::StudyUid,
        ) -> dwl_transport::TransportResult<bytes::Bytes> {
            self.record();
            self.inner.retrieve_bulk_data(uri, study).await
        }

        async fn store_instances(&self, datasets: &[dwl_types::WireDataset]) -> dwl_transport::TransportResult<()> {
            self.inner.store_instances(datasets).await
        }

        fn without_credentials(&self) -> Option<Arc<dyn MetadataTransport>> {
            Some(Arc::new(Recording {
                inner: self.inner.clone(),
                credentialed: false,
                calls: self.calls.clone(),
            }))
        }
    }

    #[tokio::test]
    async fn request_can_withhold_credentials() {
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let transport = Arc::new(Recording {
            inner: fixtures::transport(),
            credentialed: true,
            calls: calls.clone(),
        });
        let store: Arc<dyn MetadataStore> = Arc::new(InMemoryMetadataStore::new());
        let session = RetrieveSession::from_parts(&fixtures::config(), transport, store).unwrap();
        let request = RetrieveRequest::new(fixtures::STUDY).with_strategy(Strategy::Lazy);

        session.retrieve_lazy(&request).await.unwrap().completion().await.unwrap();
        let credentialed = std::mem::take(&mut *calls.lock().unwrap());
        assert_eq!(credentialed, [true, true, true]);

        let anonymous = request.clone().allow_credentialed_requests(false);
        session.retrieve_lazy(&anonymous).await.unwrap().completion().await.unwrap();
        assert_eq!(*calls.lock().unwrap(), [false, false, false]);
        assert_eq!(session.transport().name(), "recording");
    }

    #[tokio::test]
    async fn reload_replaces_cached_study() {
        let (session, transport, store) = fixtures::session();
        let request = RetrieveRequest::new(fixtures::STUDY).with_strategy(Strategy::Lazy);
        let first = session.retrieve_lazy(&request).await.unwrap().completion().await.unwrap();
        assert_eq!(first.succeeded.len(), 1);

        transport.add_series(fixtures::STUDY, "S1", fixtures::listing("S1", "CT", 1, 2), fixtures::instances("S1", 2));
        match session.reload(&request).await.unwrap() {
            RetrieveOutcome::Lazy(retrieval) => {
                retrieval.completion().await.unwrap();
            }
            RetrieveOutcome::Eager(_) => panic!("expected lazy"),
        }
        let study = dwl_types::StudyUid::new(fixtures::STUDY);
        assert_eq!(store.epoch(&study), 1);
        assert_eq!(store.instance_count(&study), 2);
        assert!(store.is_loaded(&study));
    }
}
