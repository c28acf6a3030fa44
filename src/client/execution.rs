//! 请求执行：拦截器链、超时与取消竞速、重试循环、失败分类。
//!
//! Request execution: interceptor phases, the dispatch race, the retry loop and
//! failure classification.

use crate::client::abort::{interruptible_sleep, race};
use crate::client::error_classification::{classify, RawOutcome};
use crate::client::types::{
    resolve_url, CallOptions, Method, RequestContext, RequestDescriptor, Response,
};
use crate::cancel::CancellationToken;
use crate::interceptors::ChainSnapshot;
use crate::transport::HttpResponse;
use crate::{CallResult, Failure};
use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use super::core::RestClient;

impl RestClient {
    /// Execute one call through the full pipeline.
    ///
    /// `url` is resolved against the base URL unless absolute. Before-dispatch hooks
    /// run once; the prepared request is then raced against its timeout and
    /// cancellation token, re-dispatched while a hook asks for a retry, and finally
    /// decoded (2xx) or classified.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        options: CallOptions,
    ) -> CallResult<Response> {
        let token = options.cancel_token.clone();
        let retry_key = options.retry_key.clone();

        let prepared = resolve_url(self.base_url.as_ref(), url)
            .and_then(|url| self.prepare(method, url, options));
        let request = match prepared {
            Ok(request) => request,
            Err(failure) => return Err(classify(RawOutcome::Failure(failure), token.as_ref())),
        };

        let mut ctx = RequestContext::new(method, request.url.clone(), retry_key.as_deref());
        let chain = self.interceptors.snapshot();
        let _settle = SettleGuard {
            chain: chain.clone(),
            ctx: ctx.clone(),
        };
        let request = chain.before_dispatch(&ctx, request).await;
        ctx.url = request.url.clone();

        let start = Instant::now();
        let result = self.dispatch(&chain, &mut ctx, &request).await;

        match &result {
            Ok(response) => info!(
                request_id = ctx.request_id.as_str(),
                method = method.as_str(),
                http_status = response.status,
                retry_count = ctx.attempt,
                duration_ms = start.elapsed().as_millis() as u64,
                "rest-pipeline request succeeded"
            ),
            Err(failure) => warn!(
                request_id = ctx.request_id.as_str(),
                method = method.as_str(),
                failure_kind = failure.kind().name(),
                failure_code = failure.kind().code(),
                http_status = failure.status(),
                retry_count = ctx.attempt,
                duration_ms = start.elapsed().as_millis() as u64,
                "rest-pipeline request failed"
            ),
        }

        result
    }

    fn prepare(
        &self,
        method: Method,
        url: Url,
        options: CallOptions,
    ) -> CallResult<RequestDescriptor> {
        let mut headers = self.default_headers.clone();
        for (name, value) in &options.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Failure::validation(format!("invalid header name: {}", name)))?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                Failure::validation(format!("invalid value for header {}", name))
            })?;
            headers.insert(header_name, header_value);
        }

        let body = match options.body {
            Some(value) => {
                let encoded = serde_json::to_vec(&value).map_err(|e| {
                    Failure::validation(format!("failed to encode request body: {}", e))
                })?;
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                Some(Bytes::from(encoded))
            }
            None => None,
        };

        Ok(RequestDescriptor {
            method,
            url,
            headers,
            body,
            timeout: options.timeout.unwrap_or(self.default_timeout),
            cancel_token: options.cancel_token,
        })
    }

    async fn dispatch(
        &self,
        chain: &ChainSnapshot,
        ctx: &mut RequestContext,
        request: &RequestDescriptor,
    ) -> CallResult<Response> {
        let token = request.cancel_token.as_ref();

        let failure = loop {
            debug!(
                request_id = ctx.request_id.as_str(),
                attempt = ctx.attempt,
                method = request.method.as_str(),
                timeout_ms = request.timeout.as_millis() as u64,
                "dispatching"
            );

            let outcome = race(self.transport.send(request.to_http()), request.timeout, token).await;
            let response = match outcome {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => break classify(RawOutcome::Transport(&err), token),
                Err(reason) => break classify(RawOutcome::Aborted(reason), token),
            };

            let (response, retry) = chain.after_dispatch(ctx, response).await;
            match retry {
                None => return settle(response, token),
                Some(delay) => {
                    if let Err(reason) = interruptible_sleep(delay, token).await {
                        break classify(RawOutcome::Aborted(reason), token);
                    }
                    ctx.attempt += 1;
                }
            }
        };

        let failure = chain.on_error(ctx, failure).await;
        Err(classify(RawOutcome::Failure(failure), token))
    }
}

/// Runs the chain's settle hooks when a call ends, including when its future is dropped.
struct SettleGuard {
    chain: ChainSnapshot,
    ctx: RequestContext,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        self.chain.settled(&self.ctx);
    }
}

/// Turn the final response into the call's result.
fn settle(response: HttpResponse, token: Option<&CancellationToken>) -> CallResult<Response> {
    let cancelled = token.map_or(false, |t| t.is_cancelled());
    if cancelled || !response.is_success() {
        return Err(classify(
            RawOutcome::Response {
                status: response.status,
                body: &response.body,
            },
            token,
        ));
    }

    let data = if response.body.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&response.body)
            .map_err(|e| Failure::parse(format!("failed to decode response body: {}", e)))?
    };

    Ok(Response {
        status: response.status,
        headers: response.headers,
        data,
    })
}
