//! Racing a dispatch against its deadline and the caller's cancellation.
//!
//! The two sources form one abort signal: whichever fires first wins, and the losing
//! futures (including the transport call) are dropped exactly once when the race settles.

use crate::cancel::CancellationToken;
use std::future::Future;
use std::time::Duration;

/// Why a raced operation was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    Timeout(Duration),
    Cancelled,
}

async fn wait_cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

/// Run `operation` until it completes, `timeout` elapses, or `token` is cancelled.
///
/// Cancellation is polled first, so a token cancelled before the call starts never
/// dispatches anything.
pub(crate) async fn race<F, T>(
    operation: F,
    timeout: Duration,
    token: Option<&CancellationToken>,
) -> Result<T, AbortReason>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = wait_cancelled(token) => Err(AbortReason::Cancelled),
        _ = tokio::time::sleep(timeout) => Err(AbortReason::Timeout(timeout)),
        out = operation => Ok(out),
    }
}

/// Sleep for `delay` unless `token` is cancelled first.
pub(crate) async fn interruptible_sleep(
    delay: Duration,
    token: Option<&CancellationToken>,
) -> Result<(), AbortReason> {
    tokio::select! {
        biased;
        _ = wait_cancelled(token) => Err(AbortReason::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
