use serde::{Deserialize, Serialize};

/// Base a relative `BulkDataURI` is resolved against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelativeResolution {
    /// `{wado_root}/studies/{study}/`
    #[default]
    Studies,
    /// `{wado_root}/studies/{study}/series/{series}/`
    Series,
}

/// How bulk data references are prepared before they reach the cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkDataUriConfig {
    /// Rewrite relative URIs. When off, URIs are kept as the server sent
    /// them and the transport resolves them against the study.
    pub enabled: bool,
    pub relative_resolution: RelativeResolution,
}

impl Default for BulkDataUriConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            relative_resolution: RelativeResolution::Studies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BulkDataUriConfig::default();
        assert!(config.enabled);
        assert_eq!(config.relative_resolution, RelativeResolution::Studies);
    }

    #[test]
    fn relative_resolution_is_lowercase() {
        let config: BulkDataUriConfig =
            serde_json::from_str(r#"{"relative_resolution": "series"}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.relative_resolution, RelativeResolution::Series);
    }
}
