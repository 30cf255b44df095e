use std::path::Path;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use dwl_bulkdata::BulkDataUriConfig;
use dwl_imageid::{ImageIdConfig, ImageRendering};
use dwl_transport::HttpTransportConfig;

use crate::error::{RetrieveError, RetrieveResult};
use crate::request::Strategy;

/// One DICOMweb data source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceConfig {
    pub name: String,
    pub wado_root: String,
    pub qido_root: String,
    /// Root for `wadouri:` image ids.
    pub wado_uri_root: String,
    pub image_rendering: ImageRendering,
    /// Read a precomputed static tree instead of a live server.
    pub static_wado: bool,
    /// Default to the lazy strategy when a request does not pick one.
    pub lazy_load: bool,
    pub allow_credentialed_requests: bool,
    pub request_timeout_secs: u64,
    pub bulk_data: BulkDataUriConfig,
    /// Cap on series fetched at once. Unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_series: Option<usize>,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            name: "dicomweb".into(),
            wado_root: "http://localhost:8042/dicom-web".into(),
            qido_root: "http://localhost:8042/dicom-web".into(),
            wado_uri_root: "http://localhost:8042/wado".into(),
            image_rendering: ImageRendering::Wadors,
            static_wado: false,
            lazy_load: true,
            allow_credentialed_requests: true,
            request_timeout_secs: 30,
            bulk_data: BulkDataUriConfig::default(),
            max_concurrent_series: None,
        }
    }
}

impl DataSourceConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> RetrieveResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| RetrieveError::Configuration(format!("parse config: {e}")))?;
        config.validated()
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> RetrieveResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RetrieveError::Configuration(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> RetrieveResult<String> {
        toml::to_string_pretty(self).map_err(|e| RetrieveError::Configuration(format!("render config: {e}")))
    }

    /// Check every root parses as a URL, strip trailing slashes and reject
    /// zero limits.
    pub fn validated(mut self) -> RetrieveResult<Self> {
        for (label, root) in [
            ("wado_root", &mut self.wado_root),
            ("qido_root", &mut self.qido_root),
            ("wado_uri_root", &mut self.wado_uri_root),
        ] {
            Url::parse(root).map_err(|e| RetrieveError::Configuration(format!("{label} '{root}': {e}")))?;
            while root.ends_with('/') {
                root.pop();
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(RetrieveError::Configuration("request_timeout_secs must be positive".into()));
        }
        if self.max_concurrent_series == Some(0) {
            return Err(RetrieveError::Configuration("max_concurrent_series must be positive".into()));
        }
        Ok(self)
    }

    /// Settings for the HTTP backends.
    pub fn http_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            qido_root: self.qido_root.clone(),
            wado_root: self.wado_root.clone(),
            request_timeout_secs: self.request_timeout_secs,
            allow_credentialed_requests: self.allow_credentialed_requests,
            ..Default::default()
        }
    }

    /// Settings for image id synthesis.
    pub fn image_id_config(&self) -> ImageIdConfig {
        ImageIdConfig {
            rendering: self.image_rendering,
            wado_root: self.wado_root.clone(),
            wado_uri_root: self.wado_uri_root.clone(),
        }
    }

    /// Lazy when the source supports it, eager otherwise.
    pub fn default_strategy(&self) -> Strategy {
        if self.lazy_load {
            Strategy::Lazy
        } else {
            Strategy::Eager
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use dwl_bulkdata::RelativeResolution;

    #[test]
    fn default_config() {
        let c = DataSourceConfig::default();
        assert!(c.lazy_load);
        assert!(!c.static_wado);
        assert_eq!(c.image_rendering, ImageRendering::Wadors);
        assert_eq!(c.default_strategy(), Strategy::Lazy);
        assert!(c.max_concurrent_series.is_none());
        assert!(c.clone().validated().is_ok());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let c = DataSourceConfig::from_toml_str(
            r#"
            name = "pacs"
            wado_root = "https://pacs.example.org/dicom-web/"
            qido_root = "https://pacs.example.org/dicom-web"
            lazy_load = false
            max_concurrent_series = 4

            [bulk_data]
            relative_resolution = "series"
            "#,
        )
        .unwrap();
        assert_eq!(c.name, "pacs");
        assert_eq!(c.wado_root, "https://pacs.example.org/dicom-web");
        assert_eq!(c.default_strategy(), Strategy::Eager);
        assert_eq!(c.max_concurrent_series, Some(4));
        assert_eq!(c.bulk_data.relative_resolution, RelativeResolution::Series);
        assert!(c.bulk_data.enabled);
        assert_eq!(c.request_timeout_secs, 30);
    }

    #[test]
    fn invalid_root_is_a_configuration_error() {
        let err = DataSourceConfig::from_toml_str(r#"wado_root = "not a url""#).unwrap_err();
        assert!(matches!(err, RetrieveError::Configuration(ref m) if m.contains("wado_root")));
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(DataSourceConfig::from_toml_str("max_concurrent_series = 0").is_err());
        assert!(DataSourceConfig::from_toml_str("request_timeout_secs = 0").is_err());
    }

    #[test]
    fn default_round_trips_through_toml() {
        let text = DataSourceConfig::default().to_toml_string().unwrap();
        assert_eq!(DataSourceConfig::from_toml_str(&text).unwrap(), DataSourceConfig::default());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"local\"\nstatic_wado = true").unwrap();
        let c = DataSourceConfig::load(file.path()).unwrap();
        assert_eq!(c.name, "local");
        assert!(c.static_wado);
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataSourceConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, RetrieveError::Configuration(_)));
    }

    #[test]
    fn derived_configs_share_roots() {
        let c = DataSourceConfig::default();
        assert_eq!(c.http_config().wado_root, c.wado_root);
        assert_eq!(c.image_id_config().wado_uri_root, c.wado_uri_root);
    }
}
