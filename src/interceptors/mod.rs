//! 拦截器：在请求分发前、响应到达后、出错时运行的可插拔钩子。
//!
//! Interceptor hooks for cross-cutting concerns (auth, logging, retry, custom behavior).
//!
//! An interceptor implements any subset of three hooks; the ones it leaves out are
//! pass-through no-ops. Hooks of one phase run in registration order. The list is
//! snapshotted when a call starts, so adding or removing interceptors at runtime never
//! changes the chain an in-flight request is using.

pub mod auth;
pub mod logging;
pub mod retry;

pub use auth::AuthInterceptor;
pub use logging::{LogBuffer, LogPhase, LogRecord, LoggingInterceptor};
pub use retry::{RetryConfig, RetryInterceptor};

use crate::client::types::{RequestContext, RequestDescriptor};
use crate::transport::HttpResponse;
use crate::Failure;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// What an after-dispatch hook decided about a response.
#[derive(Debug)]
pub enum ResponseAction {
    /// Hand the (possibly modified) response on.
    Proceed(HttpResponse),
    /// Dispatch the same request again after `delay`.
    Retry {
        response: HttpResponse,
        delay: Duration,
    },
}

impl ResponseAction {
    pub fn response(&self) -> &HttpResponse {
        match self {
            ResponseAction::Proceed(response) | ResponseAction::Retry { response, .. } => response,
        }
    }
}

#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Name used for logging and for [`InterceptorChain::remove`].
    fn name(&self) -> &str {
        "interceptor"
    }

    /// Runs once per call, before the first dispatch.
    async fn before_dispatch(
        &self,
        _ctx: &RequestContext,
        request: RequestDescriptor,
    ) -> RequestDescriptor {
        request
    }

    /// Runs for every response received, including ones that will be retried.
    async fn after_dispatch(&self, _ctx: &RequestContext, response: HttpResponse) -> ResponseAction {
        ResponseAction::Proceed(response)
    }

    /// Runs when no response was received. Returning `Some` replaces the failure.
    async fn on_error(&self, _ctx: &RequestContext, _failure: &Failure) -> Option<Failure> {
        None
    }

    /// Runs exactly once when the call ends, however it ends. This includes the
    /// caller dropping the `execute` future, so it cannot be async.
    fn on_settled(&self, _ctx: &RequestContext) {}
}

/// Registered interceptors, swapped atomically on change.
pub struct InterceptorChain {
    interceptors: ArcSwap<Vec<Arc<dyn Interceptor>>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self {
            interceptors: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn from_vec(interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        Self {
            interceptors: ArcSwap::from_pointee(interceptors),
        }
    }

    pub fn push(&self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(interceptor.clone());
            next
        });
    }

    /// Remove every interceptor named `name`; returns how many were removed.
    pub fn remove(&self, name: &str) -> usize {
        let previous = self.interceptors.rcu(|current| {
            current
                .iter()
                .filter(|ic| ic.name() != name)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().filter(|ic| ic.name() == name).count()
    }

    pub fn len(&self) -> usize {
        self.interceptors.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<String> {
        self.interceptors
            .load()
            .iter()
            .map(|ic| ic.name().to_string())
            .collect()
    }

    /// Freeze the current list for one call.
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot(self.interceptors.load_full())
    }
}

impl Default for InterceptorChain {
    fn default() -> Self {
        Self::new()
    }
}

/// The interceptor list as it was when a call started.
#[derive(Clone)]
pub struct ChainSnapshot(Arc<Vec<Arc<dyn Interceptor>>>);

impl ChainSnapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub async fn before_dispatch(
        &self,
        ctx: &RequestContext,
        mut request: RequestDescriptor,
    ) -> RequestDescriptor {
        for ic in self.0.iter() {
            request = ic.before_dispatch(ctx, request).await;
        }
        request
    }

    /// Run every after-dispatch hook. All hooks see the response even after one asks
    /// for a retry; the first retry delay requested wins.
    pub async fn after_dispatch(
        &self,
        ctx: &RequestContext,
        mut response: HttpResponse,
    ) -> (HttpResponse, Option<Duration>) {
        let mut retry = None;
        for ic in self.0.iter() {
            response = match ic.after_dispatch(ctx, response).await {
                ResponseAction::Proceed(r) => r,
                ResponseAction::Retry { response: r, delay } => {
                    retry.get_or_insert(delay);
                    r
                }
            };
        }
        (response, retry)
    }

    pub async fn on_error(&self, ctx: &RequestContext, mut failure: Failure) -> Failure {
        for ic in self.0.iter() {
            if let Some(replacement) = ic.on_error(ctx, &failure).await {
                failure = replacement;
            }
        }
        failure
    }

    pub fn settled(&self, ctx: &RequestContext) {
        for ic in self.0.iter() {
            ic.on_settled(ctx);
        }
    }
}
