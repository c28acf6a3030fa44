use super::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::error::{Error, ErrorContext};
use crate::Result;
use async_trait::async_trait;
use reqwest::Proxy;
use std::env;
use std::time::Duration;

/// [`Transport`] backed by a shared `reqwest::Client`.
///
/// No overall request timeout is configured here: the pipeline races every call
/// against its own deadline and drops the future to abort.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build with production-friendly defaults (env-overridable).
    ///
    /// - `REST_PIPELINE_CONNECT_TIMEOUT_SECS` (default 10)
    /// - `REST_PIPELINE_PROXY_URL` (unset by default)
    pub fn new() -> Result<Self> {
        let connect_timeout_secs = env::var("REST_PIPELINE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        let mut builder =
            reqwest::Client::builder().connect_timeout(Duration::from_secs(connect_timeout_secs));

        if let Ok(proxy_url) = env::var("REST_PIPELINE_PROXY_URL") {
            let proxy = Proxy::all(&proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    "invalid proxy URL",
                    ErrorContext::new()
                        .with_field_path("REST_PIPELINE_PROXY_URL")
                        .with_details(e.to_string())
                        .with_source("reqwest_transport"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| {
            Error::configuration_with_context(
                "failed to build HTTP client",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("reqwest_transport"),
            )
        })?;

        Ok(Self { client })
    }

    /// Wrap an existing client, e.g. one shared with other parts of an application.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
