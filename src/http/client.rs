//! HTTP transport seam and the retrying client built on top of it

use crate::http::identity::ClientConfig;
use crate::http::retry::RetryPolicy;
use crate::utils::error::{AcfunError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{header, Client};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;

/// Failure of a single request attempt
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("connection error: {0}")]
    Connect(String),

    #[error("response body error: {0}")]
    Body(String),

    #[error("local IO error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if let Some(status) = e.status() {
            TransportError::Status(status.as_u16())
        } else if e.is_connect() || e.is_request() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Body(e.to_string())
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e.to_string())
    }
}

pub type ByteStream = BoxStream<'static, std::result::Result<Bytes, TransportError>>;

/// An opened streaming response
pub struct StreamResponse {
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

/// Raw GET operations. The production implementation talks to the network;
/// tests substitute scripted responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_text(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> std::result::Result<String, TransportError>;

    async fn get_stream(&self, url: &str) -> std::result::Result<StreamResponse, TransportError>;
}

/// `reqwest`-backed transport carrying the process identity headers
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Ok(referer) = header::HeaderValue::from_str(&config.referer) {
            headers.insert(header::REFERER, referer);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| {
                AcfunError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("failed to build HTTP client: {e}"),
                ))
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get_text(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> std::result::Result<String, TransportError> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    async fn get_stream(&self, url: &str) -> std::result::Result<StreamResponse, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from))
            .boxed();

        Ok(StreamResponse {
            content_length,
            body,
        })
    }
}

/// Transport plus the timeout and retry policy applied to every page fetch
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(transport: Arc<dyn Transport>, retry: RetryPolicy, timeout: Duration) -> Self {
        Self {
            transport,
            retry,
            timeout,
        }
    }

    /// Network-backed client using the given identity
    pub fn from_config(config: &ClientConfig, retry: RetryPolicy) -> Result<Self> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), retry, config.timeout))
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET a page body, retrying transient failures.
    pub async fn get_text(&self, url: &str, query: &[(String, String)]) -> Result<String> {
        debug!("GET {} {:?}", url, query);
        self.retry
            .run(url, |_| async move {
                match timeout(self.timeout, self.transport.get_text(url, query)).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout),
                }
            })
            .await
            .map_err(|failure| AcfunError::Fetch {
                url: url.to_string(),
                attempts: failure.attempts,
                cause: failure.last,
            })
    }

    /// Open a streaming GET. One attempt only: callers that write the body
    /// somewhere own the retry loop so a retry restarts the whole transfer.
    pub async fn open_stream(
        &self,
        url: &str,
    ) -> std::result::Result<StreamResponse, TransportError> {
        match timeout(self.timeout, self.transport.get_stream(url)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }
}
