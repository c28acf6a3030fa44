//! 协作式取消：调用方持有令牌，可同时取消多个进行中的请求。
//!
//! Cooperative cancellation for in-flight requests.
//!
//! A [`CancellationToken`] is created by the caller for one logical operation. Clones share
//! the same state, so a single token attached to many concurrent requests cancels all of them.
//!
//! ```rust
//! use rest_pipeline::CancellationToken;
//!
//! let (token, handle) = CancellationToken::source();
//! assert!(!token.is_cancelled());
//!
//! handle.cancel_with("user navigated away");
//! handle.cancel_with("ignored, already cancelled");
//!
//! assert!(token.is_cancelled());
//! assert_eq!(token.reason(), Some("user navigated away"));
//! ```

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tokio_util::sync::WaitForCancellationFuture;

#[derive(Debug, Default)]
struct Inner {
    signal: tokio_util::sync::CancellationToken,
    /// Set exactly once, by whichever cancel call wins.
    reason: OnceCell<Option<String>>,
}

impl Inner {
    fn trigger(&self, reason: Option<String>) {
        // Reason is published before the signal fires so observers woken by the
        // signal always see it.
        let _ = self.reason.set(reason);
        self.signal.cancel();
    }
}

/// Cancellation handle shared between a caller and the requests it started.
///
/// The cancelled flag is monotonic: once set it never reverts, and only the first
/// reason supplied is kept.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token together with a detached [`CancelHandle`].
    ///
    /// Useful when cancellation is triggered from a different place than the one
    /// passing the token into request options.
    pub fn source() -> (Self, CancelHandle) {
        let token = Self::new();
        let handle = CancelHandle {
            inner: token.inner.clone(),
        };
        (token, handle)
    }

    /// Cancel without a reason. Idempotent.
    pub fn cancel(&self) {
        self.inner.trigger(None);
    }

    /// Cancel with a human-readable reason. Idempotent; later reasons are ignored.
    pub fn cancel_with(&self, reason: impl Into<String>) {
        self.inner.trigger(Some(reason.into()));
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.signal.is_cancelled()
    }

    pub fn reason(&self) -> Option<&str> {
        self.inner.reason.get().and_then(|r| r.as_deref())
    }

    /// Future that resolves once the token is cancelled (immediately if it already is).
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.signal.cancelled()
    }

    /// The underlying signal, for composing with other tokio-util based cancellation.
    ///
    /// Cancelling the returned signal directly does not record a reason.
    pub fn signal(&self) -> tokio_util::sync::CancellationToken {
        self.inner.signal.clone()
    }
}

/// Detached trigger for a [`CancellationToken`] obtained from [`CancellationToken::source`].
#[derive(Debug, Clone)]
pub struct CancelHandle {
    inner: Arc<Inner>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.inner.trigger(None);
    }

    pub fn cancel_with(&self, reason: impl Into<String>) {
        self.inner.trigger(Some(reason.into()));
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.signal.is_cancelled()
    }
}
