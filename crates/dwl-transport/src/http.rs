use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

use dwl_types::WireDataset;

use crate::auth::AuthHeaderProvider;
use crate::config::HttpTransportConfig;
use crate::error::{TransportError, TransportResult};

/// `reqwest` client plus the per-request header policy shared by the HTTP
/// backends. Clones share the connection pool.
#[derive(Clone)]
pub(crate) struct HttpClient {
    http: Client,
    auth: Arc<dyn AuthHeaderProvider>,
    allow_credentialed_requests: bool,
}

/// Body and content type of a successful response.
pub(crate) struct Payload {
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl HttpClient {
    pub fn new(config: &HttpTransportConfig, auth: Arc<dyn AuthHeaderProvider>) -> TransportResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::InvalidConfig(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            auth,
            allow_credentialed_requests: config.allow_credentialed_requests,
        })
    }

    /// Same client and pool, but provider headers are never attached.
    pub fn without_credentials(&self) -> Self {
        Self {
            allow_credentialed_requests: false,
            ..self.clone()
        }
    }

    fn auth_headers(&self) -> TransportResult<HeaderMap> {
        let mut map = HeaderMap::new();
        if !self.allow_credentialed_requests {
            return Ok(map);
        }
        for (name, value) in self.auth.headers() {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| TransportError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            let header_value = HeaderValue::from_str(&value).map_err(|e| TransportError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    fn request(&self, method: Method, url: &str) -> TransportResult<RequestBuilder> {
        debug!(%method, %url, "building request");
        Ok(self.http.request(method, url).headers(self.auth_headers()?))
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> TransportResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::NOT_FOUND => TransportError::NotFound(url.to_string()),
                _ => TransportError::Http {
                    status: status.as_u16(),
                    url: url.to_string(),
                },
            });
        }
        Ok(response)
    }

    pub async fn get(&self, url: &str, accept: &str) -> TransportResult<Payload> {
        let request = self.request(Method::GET, url)?.header(ACCEPT, accept);
        let response = self.send(request, url).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;
        debug!(%url, bytes = body.len(), "response received");
        Ok(Payload { content_type, body })
    }

    /// GET a JSON array of datasets. An empty body (QIDO-RS `204 No
    /// Content`) is an empty list.
    pub async fn get_datasets(&self, url: &str, accept: &str) -> TransportResult<Vec<WireDataset>> {
        let payload = self.get(url, accept).await?;
        if payload.body.is_empty() {
            return Ok(Vec::new());
        }
        Ok(WireDataset::list_from_slice(&payload.body)?)
    }

    pub async fn post(&self, url: &str, content_type: &str, body: Vec<u8>) -> TransportResult<()> {
        let request = self
            .request(Method::POST, url)?
            .header(CONTENT_TYPE, content_type)
            .body(body);
        self.send(request, url).await?;
        Ok(())
    }
}
