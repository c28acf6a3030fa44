use crate::cancel::CancellationToken;
use crate::transport::HttpRequest;
use crate::Failure;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// HTTP methods the pipeline dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Failure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(Failure::validation(format!(
                "unsupported HTTP method: {}",
                other
            ))),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub headers: HashMap<String, String>,
    pub body: Option<serde_json::Value>,
    pub cancel_token: Option<CancellationToken>,
    /// Overrides the client's default timeout for this call.
    pub timeout: Option<Duration>,
    /// Share a retry budget between calls that pass the same key.
    pub retry_key: Option<String>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize any body type to JSON. Fails with [`Failure::Validation`].
    pub fn json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, Failure> {
        let value = serde_json::to_value(body)
            .map_err(|e| Failure::validation(format!("failed to serialize request body: {}", e)))?;
        Ok(self.body(value))
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry_key(mut self, key: impl Into<String>) -> Self {
        self.retry_key = Some(key.into());
        self
    }
}

/// The request as seen by interceptors.
///
/// Hooks receive a descriptor by value and hand back a new one; the pipeline never
/// reads a descriptor a hook still holds.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Duration,
    pub cancel_token: Option<CancellationToken>,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: Url, timeout: Duration) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout,
            cancel_token: None,
        }
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    /// Set a header, replacing any previous value. Invalid names or values are ignored
    /// with a warning, since hooks have no error channel.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "ignoring invalid header set by interceptor"),
        }
        self
    }

    /// Set a query parameter, replacing every existing occurrence of `name`.
    pub fn with_query_param(mut self, name: &str, value: &str) -> Self {
        let kept: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(k, _)| k != name)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut pairs = self.url.query_pairs_mut();
            pairs.clear();
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
            pairs.append_pair(name, value);
        }
        self
    }

    pub(crate) fn to_http(&self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

/// Identifies whose attempt counter a retry belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RetryKey(String);

impl RetryKey {
    pub fn new(method: Method, url: &Url, discriminator: &str) -> Self {
        RetryKey(format!("{} {}#{}", method, url, discriminator))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RetryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-call context handed to every hook.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique per `execute` call.
    pub request_id: String,
    pub method: Method,
    /// The resolved URL; after before-dispatch hooks have run, the URL actually sent.
    pub url: Url,
    /// 0 for the first dispatch, incremented on every retry.
    pub attempt: u32,
    pub retry_key: RetryKey,
}

impl RequestContext {
    /// Context for a call. Without a caller-supplied key the retry key is scoped to
    /// this call alone.
    pub fn new(method: Method, url: Url, retry_key: Option<&str>) -> Self {
        let request_id = uuid::Uuid::new_v4().to_string();
        let retry_key = RetryKey::new(method, &url, retry_key.unwrap_or(&request_id));
        Self {
            request_id,
            method,
            url,
            attempt: 0,
            retry_key,
        }
    }
}

/// A successful (2xx) response with its body decoded as JSON.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: HeaderMap,
    /// `Null` when the body was empty.
    pub data: serde_json::Value,
}

impl Response {
    /// Decode the body into a typed value. Fails with [`Failure::Parse`].
    pub fn json<T: DeserializeOwned>(self) -> Result<T, Failure> {
        serde_json::from_value(self.data)
            .map_err(|e| Failure::parse(format!("failed to decode response body: {}", e)))
    }
}

/// Resolve `target` against an optional base URL.
///
/// Absolute `http(s)` URLs are used as-is; relative ones are joined with exactly one `/`.
pub(crate) fn resolve_url(base: Option<&Url>, target: &str) -> Result<Url, Failure> {
    let lower = target.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Url::parse(target)
            .map_err(|e| Failure::validation(format!("invalid URL '{}': {}", target, e)));
    }

    let base = base.ok_or_else(|| {
        Failure::validation(format!(
            "relative URL '{}' requires a configured base URL",
            target
        ))
    })?;
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        target.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| Failure::validation(format!("invalid URL '{}': {}", joined, e)))
}
