use crate::client::core::RestClient;
use crate::config::{PipelineConfig, DEFAULT_TIMEOUT_MS};
use crate::error::{Error, ErrorContext};
use crate::interceptors::{Interceptor, InterceptorChain, RetryConfig, RetryInterceptor};
use crate::transport::{ReqwestTransport, Transport};
use crate::Result;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Builder for creating clients with custom configuration.
///
/// Everything the pipeline depends on (base URL, transport, interceptors) is passed
/// in here; there is no process-wide state.
pub struct RestClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    headers: Vec<(String, String)>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    retry: Option<RetryConfig>,
    transport: Option<Arc<dyn Transport>>,
}

impl RestClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            headers: Vec::new(),
            interceptors: Vec::new(),
            retry: None,
            transport: None,
        }
    }

    /// Start from a loaded [`PipelineConfig`].
    pub fn from_config(config: PipelineConfig) -> Self {
        let mut builder = Self::new();
        builder.base_url = config.base_url;
        builder.timeout = Duration::from_millis(config.timeout_ms);
        let mut headers: Vec<(String, String)> = config.headers.into_iter().collect();
        headers.sort();
        builder.headers = headers;
        builder.retry = config.retry;
        builder
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Default per-call timeout (30 s unless set).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Register an interceptor. Hooks run in registration order.
    pub fn interceptor<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Register a shared interceptor, e.g. an auth interceptor whose credential is
    /// rotated from elsewhere.
    pub fn interceptor_arc(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Install a retry interceptor after every explicitly registered interceptor.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn transport_arc(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client. Misconfiguration is a programmer error reported here.
    pub fn build(self) -> Result<RestClient> {
        let base_url = self.base_url.as_deref().map(parse_base_url).transpose()?;

        if self.timeout.is_zero() {
            return Err(Error::configuration_with_context(
                "timeout must be greater than zero",
                ErrorContext::new()
                    .with_field_path("timeout")
                    .with_source("client_builder"),
            ));
        }

        let mut default_headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Error::configuration_with_context(
                    "invalid header name",
                    ErrorContext::new()
                        .with_field_path(format!("headers.{}", name))
                        .with_details(e.to_string())
                        .with_source("client_builder"),
                )
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                Error::configuration_with_context(
                    "invalid header value",
                    ErrorContext::new()
                        .with_field_path(format!("headers.{}", name))
                        .with_details(e.to_string())
                        .with_source("client_builder"),
                )
            })?;
            default_headers.insert(header_name, header_value);
        }

        let mut interceptors = self.interceptors;
        if let Some(retry) = self.retry {
            interceptors.push(Arc::new(RetryInterceptor::new(retry)));
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(RestClient {
            base_url,
            default_timeout: self.timeout,
            default_headers,
            interceptors: InterceptorChain::from_vec(interceptors),
            transport,
        })
    }
}

impl Default for RestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let invalid = |details: String| {
        Error::configuration_with_context(
            "invalid base URL",
            ErrorContext::new()
                .with_field_path("base_url")
                .with_details(details)
                .with_source("client_builder"),
        )
    };

    let url = Url::parse(raw).map_err(|e| invalid(format!("{}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid(format!("{} cannot be a base URL", raw)));
    }
    Ok(url)
}
