//! Credential injection into the outgoing query string.

use super::Interceptor;
use crate::client::types::{RequestContext, RequestDescriptor};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::sync::Arc;

pub const DEFAULT_CREDENTIAL_PARAM: &str = "api_key";

/// Adds `?<param>=<credential>` to every request, replacing any value already present.
///
/// The credential can be rotated with [`AuthInterceptor::set_credential`] while the
/// client is in use; calls already past `before_dispatch` keep the old value.
pub struct AuthInterceptor {
    param: String,
    credential: ArcSwap<String>,
}

impl AuthInterceptor {
    pub fn new(credential: impl Into<String>) -> Self {
        Self::with_param(DEFAULT_CREDENTIAL_PARAM, credential)
    }

    pub fn with_param(param: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            credential: ArcSwap::from_pointee(credential.into()),
        }
    }

    pub fn set_credential(&self, credential: impl Into<String>) {
        self.credential.store(Arc::new(credential.into()));
    }

    pub fn param(&self) -> &str {
        &self.param
    }
}

#[async_trait]
impl Interceptor for AuthInterceptor {
    fn name(&self) -> &str {
        "auth"
    }

    async fn before_dispatch(
        &self,
        _ctx: &RequestContext,
        request: RequestDescriptor,
    ) -> RequestDescriptor {
        let credential = self.credential.load();
        request.with_query_param(&self.param, credential.as_str())
    }
}
