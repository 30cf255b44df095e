use serde::{Deserialize, Serialize};

/// Scheme the rendering layer loads frames through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageRendering {
    /// WADO-RS frame retrieval.
    #[default]
    Wadors,
    /// WADO-URI object retrieval.
    Wadouri,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageIdConfig {
    pub rendering: ImageRendering,
    pub wado_root: String,
    pub wado_uri_root: String,
}

impl Default for ImageIdConfig {
    fn default() -> Self {
        Self {
            rendering: ImageRendering::Wadors,
            wado_root: "http://localhost:8042/dicom-web".into(),
            wado_uri_root: "http://localhost:8042/wado".into(),
        }
    }
}

impl ImageIdConfig {
    /// WADO-RS ids under `wado_root`.
    pub fn wadors(wado_root: impl Into<String>) -> Self {
        Self {
            rendering: ImageRendering::Wadors,
            wado_root: wado_root.into(),
            ..Default::default()
        }
    }

    /// WADO-URI ids under `wado_uri_root`.
    pub fn wadouri(wado_uri_root: impl Into<String>) -> Self {
        Self {
            rendering: ImageRendering::Wadouri,
            wado_uri_root: wado_uri_root.into(),
            ..Default::default()
        }
    }
}
