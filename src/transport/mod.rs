//! 传输层：宿主环境提供的异步 HTTP 原语。
//!
//! The asynchronous HTTP primitive the pipeline runs on.
//!
//! The pipeline owns timeouts, cancellation and retries; a [`Transport`] only sends one
//! request and returns whatever came back. Dropping the future returned by
//! [`Transport::send`] must abort the call.

mod http;

pub use http::ReqwestTransport;

use crate::client::types::Method;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use url::Url;

/// A fully prepared request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// The raw response returned by a [`Transport`], before any decoding.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Lossy UTF-8 view of the body, for logging and error messages.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// A failure below HTTP: no response was received.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Transport timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn message(&self) -> &str {
        match self {
            TransportError::Connect(m) | TransportError::Timeout(m) | TransportError::Other(m) => m,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}
