use crate::client::types::{CallOptions, Method, Response};
use crate::interceptors::{Interceptor, InterceptorChain};
use crate::transport::Transport;
use crate::CallResult;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// The request pipeline: one entry point for every call a feature repository makes.
///
/// Every call resolves to either a decoded value or exactly one [`crate::Failure`];
/// nothing is thrown past [`RestClient::execute`]. A single client can serve any
/// number of concurrent calls; the only state shared between them lives inside
/// interceptors (e.g. the retry interceptor's attempt counters).
pub struct RestClient {
    pub(crate) base_url: Option<Url>,
    pub(crate) default_timeout: Duration,
    pub(crate) default_headers: HeaderMap,
    pub(crate) interceptors: InterceptorChain,
    pub(crate) transport: Arc<dyn Transport>,
}

impl RestClient {
    pub fn builder() -> crate::client::builder::RestClientBuilder {
        crate::client::builder::RestClientBuilder::new()
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Register an interceptor at the end of the chain. Calls already in flight keep
    /// the chain they started with.
    pub fn add_interceptor<I: Interceptor + 'static>(&self, interceptor: I) {
        self.interceptors.push(Arc::new(interceptor));
    }

    pub fn add_interceptor_arc(&self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Remove interceptors by name; returns how many were removed.
    pub fn remove_interceptor(&self, name: &str) -> usize {
        self.interceptors.remove(name)
    }

    pub fn interceptor_names(&self) -> Vec<String> {
        self.interceptors.names()
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str, options: CallOptions) -> CallResult<T> {
        self.execute(Method::Get, url, options).await?.json()
    }

    pub async fn post<T: DeserializeOwned>(&self, url: &str, options: CallOptions) -> CallResult<T> {
        self.execute(Method::Post, url, options).await?.json()
    }

    pub async fn put<T: DeserializeOwned>(&self, url: &str, options: CallOptions) -> CallResult<T> {
        self.execute(Method::Put, url, options).await?.json()
    }

    pub async fn patch<T: DeserializeOwned>(&self, url: &str, options: CallOptions) -> CallResult<T> {
        self.execute(Method::Patch, url, options).await?.json()
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        options: CallOptions,
    ) -> CallResult<T> {
        self.execute(Method::Delete, url, options).await?.json()
    }
}
