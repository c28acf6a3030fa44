//! Structured request logging.
//!
//! Every hook emits one `tracing` event on the `rest_pipeline::http` target and hands
//! its input on untouched. Credential query parameters are masked in logged URLs.

use super::{Interceptor, ResponseAction};
use crate::client::types::{RequestContext, RequestDescriptor};
use crate::transport::HttpResponse;
use crate::Failure;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::Level;
use url::Url;

const LOG_TARGET: &str = "rest_pipeline::http";

macro_rules! emit {
    ($level:expr, $($arg:tt)+) => {
        if $level == Level::ERROR {
            tracing::error!(target: LOG_TARGET, $($arg)+)
        } else if $level == Level::WARN {
            tracing::warn!(target: LOG_TARGET, $($arg)+)
        } else if $level == Level::INFO {
            tracing::info!(target: LOG_TARGET, $($arg)+)
        } else if $level == Level::DEBUG {
            tracing::debug!(target: LOG_TARGET, $($arg)+)
        } else {
            tracing::trace!(target: LOG_TARGET, $($arg)+)
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPhase {
    BeforeDispatch,
    AfterDispatch,
    Error,
}

/// One observed hook invocation, as kept by a [`LogBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub label: String,
    pub phase: LogPhase,
    pub request_id: String,
    pub attempt: u32,
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
    pub failure: Option<String>,
}

/// Bounded in-memory record of what logging interceptors saw, for tests and diagnostics.
pub struct LogBuffer {
    records: RwLock<VecDeque<LogRecord>>,
    max_records: usize,
}

impl LogBuffer {
    pub fn new(max: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            max_records: max.max(1),
        }
    }

    fn push(&self, record: LogRecord) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.push_back(record);
        if records.len() > self.max_records {
            records.pop_front();
        }
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct LoggingInterceptor {
    label: String,
    level: Level,
    redacted_params: Vec<String>,
    buffer: Option<Arc<LogBuffer>>,
}

impl LoggingInterceptor {
    pub fn new() -> Self {
        Self {
            label: "logging".to_string(),
            level: Level::DEBUG,
            redacted_params: vec![
                "api_key".to_string(),
                "access_token".to_string(),
                "token".to_string(),
            ],
            buffer: None,
        }
    }

    /// Name reported in events and used by [`crate::InterceptorChain::remove`].
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Additional query parameter whose value is masked.
    pub fn redact_param(mut self, name: impl Into<String>) -> Self {
        self.redacted_params.push(name.into());
        self
    }

    pub fn with_buffer(mut self, buffer: Arc<LogBuffer>) -> Self {
        self.buffer = Some(buffer);
        self
    }

    fn redact(&self, url: &Url) -> String {
        if url.query().is_none() {
            return url.to_string();
        }
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| {
                if self.redacted_params.iter().any(|p| p.as_str() == k) {
                    (k.into_owned(), "***".to_string())
                } else {
                    (k.into_owned(), v.into_owned())
                }
            })
            .collect();
        let mut masked = url.clone();
        masked.query_pairs_mut().clear().extend_pairs(pairs);
        masked.to_string()
    }

    fn record(
        &self,
        ctx: &RequestContext,
        phase: LogPhase,
        url: String,
        status: Option<u16>,
        failure: Option<&Failure>,
    ) {
        if let Some(buffer) = &self.buffer {
            buffer.push(LogRecord {
                label: self.label.clone(),
                phase,
                request_id: ctx.request_id.clone(),
                attempt: ctx.attempt,
                method: ctx.method.to_string(),
                url,
                status,
                failure: failure.map(|f| f.kind().name().to_string()),
            });
        }
    }
}

impl Default for LoggingInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interceptor for LoggingInterceptor {
    fn name(&self) -> &str {
        &self.label
    }

    async fn before_dispatch(
        &self,
        ctx: &RequestContext,
        request: RequestDescriptor,
    ) -> RequestDescriptor {
        let url = self.redact(&request.url);
        emit!(
            self.level,
            interceptor = self.label.as_str(),
            request_id = ctx.request_id.as_str(),
            method = request.method.as_str(),
            url = url.as_str(),
            timeout_ms = request.timeout.as_millis() as u64,
            "dispatching request"
        );
        self.record(ctx, LogPhase::BeforeDispatch, url, None, None);
        request
    }

    async fn after_dispatch(&self, ctx: &RequestContext, response: HttpResponse) -> ResponseAction {
        let url = self.redact(&ctx.url);
        emit!(
            self.level,
            interceptor = self.label.as_str(),
            request_id = ctx.request_id.as_str(),
            attempt = ctx.attempt,
            method = ctx.method.as_str(),
            url = url.as_str(),
            http_status = response.status,
            body_bytes = response.body.len() as u64,
            "response received"
        );
        self.record(ctx, LogPhase::AfterDispatch, url, Some(response.status), None);
        ResponseAction::Proceed(response)
    }

    async fn on_error(&self, ctx: &RequestContext, failure: &Failure) -> Option<Failure> {
        let url = self.redact(&ctx.url);
        emit!(
            self.level,
            interceptor = self.label.as_str(),
            request_id = ctx.request_id.as_str(),
            attempt = ctx.attempt,
            method = ctx.method.as_str(),
            url = url.as_str(),
            failure_kind = failure.kind().name(),
            error = %failure,
            "request failed"
        );
        self.record(ctx, LogPhase::Error, url, None, Some(failure));
        None
    }
}
