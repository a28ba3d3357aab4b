use reqwest::{header, Client};
use thiserror::Error;
use tracing::debug;

use crate::cache::ResponseSnapshot;

use super::{RequestDescriptor, RequestMethod};

/// HTTP request timeout in seconds.
/// 30s allows for slow mobile networks while failing fast enough to fall
/// back to cached data.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Transport-level failure executing a request. These are the errors the
/// offline fallbacks recover from; HTTP error statuses are not errors at
/// this layer and come back as snapshots.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Network unreachable: {0}")]
    Disconnected(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Disconnected(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// Executes a request against the application origin and materializes the
/// result. Implemented by `HttpGateway` in production and by scripted
/// fakes in tests.
#[allow(async_fn_in_trait)]
pub trait FetchBackend {
    async fn fetch(&self, request: RequestDescriptor) -> Result<ResponseSnapshot, FetchError>;
}

/// Real network backend on top of reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    origin: String,
}

impl HttpGateway {
    pub fn new(origin: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            origin: origin.into(),
        })
    }
}

impl FetchBackend for HttpGateway {
    async fn fetch(&self, request: RequestDescriptor) -> Result<ResponseSnapshot, FetchError> {
        let url = format!("{}{}", self.origin, request.path);

        let mut builder = match request.method {
            RequestMethod::Get => self.client.get(&url),
            RequestMethod::Head => self.client.head(&url),
            RequestMethod::Post => self.client.post(&url),
            RequestMethod::Put => self.client.put(&url),
            RequestMethod::Delete => self.client.delete(&url),
            RequestMethod::Patch => self.client.patch(&url),
        };
        if let Some(ref accept) = request.accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = response.bytes().await?.to_vec();

        debug!(url = %url, status, bytes = body.len(), "Fetched");
        Ok(ResponseSnapshot::new(status, content_type, body))
    }
}
