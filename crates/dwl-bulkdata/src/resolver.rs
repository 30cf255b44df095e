use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use tracing::debug;

use dwl_transport::{endpoints, MetadataTransport};
use dwl_types::{AttributeValue, BulkDataRef, NaturalDataset, SeriesUid, StudyUid};

use crate::config::{BulkDataUriConfig, RelativeResolution};
use crate::error::{BulkDataError, BulkDataResult};

/// Owner of the records being attached.
#[derive(Clone, Copy, Debug)]
pub struct BulkDataContext<'a> {
    pub wado_root: &'a str,
    pub study: &'a StudyUid,
    pub series: &'a SeriesUid,
}

impl BulkDataContext<'_> {
    fn base(&self, resolution: RelativeResolution) -> String {
        match resolution {
            RelativeResolution::Studies => endpoints::study(self.wado_root, self.study),
            RelativeResolution::Series => endpoints::series(self.wado_root, self.study, self.series),
        }
    }
}

type CacheKey = (String, StudyUid);

/// Memoizing bulk data fetcher.
///
/// Values are cached per `(uri, study)` for the resolver's lifetime. Two
/// concurrent first requests for the same key may both reach the transport;
/// the first value stored wins.
pub struct BulkDataResolver {
    transport: Arc<dyn MetadataTransport>,
    config: BulkDataUriConfig,
    cache: RwLock<HashMap<CacheKey, Bytes>>,
}

impl BulkDataResolver {
    /// Create a resolver with an empty cache that fetches through `transport`.
    pub fn new(transport: Arc<dyn MetadataTransport>, config: BulkDataUriConfig) -> Self {
        Self {
            transport,
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// URI rewriting settings.
    pub fn config(&self) -> &BulkDataUriConfig {
        &self.config
    }

    /// Prepare every bulk data reference in `dataset`, nested sequences
    /// included, and return how many were found.
    ///
    /// With relative resolution enabled, unresolved relative URIs are
    /// rewritten against the study or series URL. Nothing is fetched.
    pub fn attach(&self, dataset: &mut NaturalDataset, ctx: &BulkDataContext<'_>) -> usize {
        let base = self
            .config
            .enabled
            .then(|| ctx.base(self.config.relative_resolution));
        attach_refs(dataset, base.as_deref())
    }

    /// Value behind `uri`, fetched on first use and memoized.
    pub async fn resolve(&self, uri: &str, study: &StudyUid) -> BulkDataResult<Bytes> {
        let key = (uri.to_string(), study.clone());
        if let Some(value) = self.cache.read().expect("lock poisoned").get(&key) {
            debug!(%uri, %study, "bulk data cache hit");
            return Ok(value.clone());
        }

        let value = self.transport.retrieve_bulk_data(uri, study).await?;
        debug!(%uri, %study, bytes = value.len(), "bulk data fetched");
        let mut cache = self.cache.write().expect("lock poisoned");
        Ok(cache.entry(key).or_insert(value).clone())
    }

    /// Bytes held by an attribute, fetching when the attribute is an
    /// unresolved reference. The attribute itself is left as is.
    pub async fn resolve_value(&self, value: &AttributeValue, study: &StudyUid) -> BulkDataResult<Bytes> {
        match value {
            AttributeValue::BulkData(BulkDataRef::Resolved { value, .. }) => Ok(value.clone()),
            AttributeValue::BulkData(BulkDataRef::Unresolved { uri }) => self.resolve(uri, study).await,
            AttributeValue::InlineBinary(encoded) => STANDARD
                .decode(encoded)
                .map(Bytes::from)
                .map_err(|e| BulkDataError::InlineBinary(e.to_string())),
            _ => Err(BulkDataError::NotBulkData),
        }
    }

    /// Resolve a bulk data attribute and record the value in it.
    pub async fn resolve_in_place(&self, value: &mut AttributeValue, study: &StudyUid) -> BulkDataResult<Bytes> {
        let reference = value.bulk_data_mut().ok_or(BulkDataError::NotBulkData)?;
        if let Some(resolved) = reference.value() {
            return Ok(resolved.clone());
        }
        let uri = reference.uri().to_string();
        let fetched = self.resolve(&uri, study).await?;
        reference.resolve(fetched.clone());
        Ok(fetched)
    }

    /// Resolve every unresolved reference in `dataset`. Returns how many
    /// were fetched or served from the cache.
    pub async fn resolve_all(&self, dataset: &mut NaturalDataset, study: &StudyUid) -> BulkDataResult<usize> {
        let mut pending = Vec::new();
        collect_unresolved(dataset, &mut pending);
        let count = pending.len();
        for reference in pending {
            let uri = reference.uri().to_string();
            let fetched = self.resolve(&uri, study).await?;
            reference.resolve(fetched);
        }
        Ok(count)
    }

    /// Number of memoized values.
    pub fn cached_len(&self) -> usize {
        self.cache.read().expect("lock poisoned").len()
    }

    /// Drop every memoized value.
    pub fn clear(&self) {
        self.cache.write().expect("lock poisoned").clear();
    }
}

fn attach_refs(dataset: &mut NaturalDataset, base: Option<&str>) -> usize {
    let mut found = 0;
    for (_, value) in dataset.iter_mut() {
        match value {
            AttributeValue::BulkData(reference) => {
                found += 1;
                if let Some(base) = base {
                    if !reference.is_resolved() && !endpoints::is_absolute(reference.uri()) {
                        let absolute = format!("{base}/{}", reference.uri().trim_start_matches('/'));
                        reference.set_uri(absolute);
                    }
                }
            }
            AttributeValue::Sequence(items) => {
                found += items.iter_mut().map(|item| attach_refs(item, base)).sum::<usize>();
            }
            _ => {}
        }
    }
    found
}

fn collect_unresolved<'a>(dataset: &'a mut NaturalDataset, out: &mut Vec<&'a mut BulkDataRef>) {
    for (_, value) in dataset.iter_mut() {
        match value {
            AttributeValue::BulkData(reference) if !reference.is_resolved() => out.push(reference),
            AttributeValue::Sequence(items) => {
                for item in items.iter_mut() {
                    collect_unresolved(item, out);
                }
            }
            _ => {}
        }
    }
}
