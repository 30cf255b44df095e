use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{TransportError, TransportResult};

/// Settings shared by the HTTP backends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpTransportConfig {
    /// QIDO-RS root, e.g. `https://pacs.example.org/dicom-web`.
    pub qido_root: String,
    /// WADO-RS root. Usually equal to `qido_root`.
    pub wado_root: String,
    pub request_timeout_secs: u64,
    /// When false, authorization headers are never attached.
    pub allow_credentialed_requests: bool,
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            qido_root: "http://localhost:8042/dicom-web".into(),
            wado_root: "http://localhost:8042/dicom-web".into(),
            request_timeout_secs: 30,
            allow_credentialed_requests: true,
            user_agent: format!("dwl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpTransportConfig {
    /// Use `root` for QIDO-RS and WADO-RS alike.
    pub fn with_root(root: &str) -> Self {
        Self {
            qido_root: root.to_string(),
            wado_root: root.to_string(),
            ..Default::default()
        }
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check both roots parse as absolute URLs and strip trailing slashes.
    pub fn validated(mut self) -> TransportResult<Self> {
        for (label, root) in [("qido_root", &mut self.qido_root), ("wado_root", &mut self.wado_root)] {
            Url::parse(root).map_err(|e| TransportError::InvalidConfig(format!("{label} '{root}': {e}")))?;
            while root.ends_with('/') {
                root.pop();
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(TransportError::InvalidConfig("request_timeout_secs must be positive".into()));
        }
        Ok(self)
    }
}
