use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("series {series} rejected by the {backend} backend")]
    Rejected { backend: &'static str, series: String },

    #[error("{operation} is not supported by the {backend} backend")]
    UnsupportedOperation {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        match (e.status(), e.url()) {
            (Some(status), Some(url)) => Self::Http {
                status: status.as_u16(),
                url: url.to_string(),
            },
            _ => Self::Request(e.to_string()),
        }
    }
}

impl From<dwl_types::TypeError> for TransportError {
    fn from(e: dwl_types::TypeError) -> Self {
        Self::Decode(e.to_string())
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
