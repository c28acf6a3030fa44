//! Failure classification: every raw outcome of a call maps to exactly one [`Failure`].
//!
//! Decision order (significant):
//! 1. explicit cancellation, even if a response arrived concurrently
//! 2. timeout / abort signature
//! 3. HTTP status table (401, 403, 404, 5xx, other non-2xx)
//! 4. transport message patterns (unreachable network)
//! 5. generic `Api` fallback

use super::abort::AbortReason;
use crate::cancel::CancellationToken;
use crate::error_code::FailureKind;
use crate::transport::TransportError;
use crate::Failure;
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest slice of a non-JSON error body carried into a failure message.
const MAX_BODY_MESSAGE_CHARS: usize = 512;

static NETWORK_UNREACHABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(connection refused|connection reset|connection closed|network is unreachable|no route to host|host is unreachable|dns error|failed to lookup address|name or service not known|broken pipe|econnrefused|econnreset|enotfound|network error|error sending request)",
    )
    .expect("static regex")
});

/// What the pipeline observed for one call, before classification.
#[derive(Debug)]
pub enum RawOutcome<'a> {
    /// A response arrived.
    Response { status: u16, body: &'a [u8] },
    /// The deadline or the caller's token aborted the call.
    Aborted(AbortReason),
    /// The transport failed without a response.
    Transport(&'a TransportError),
    /// An already-typed failure (e.g. one substituted by an error hook).
    Failure(Failure),
}

/// Classify `outcome`. `token` is the call's cancellation token, consulted first.
pub fn classify(outcome: RawOutcome<'_>, token: Option<&CancellationToken>) -> Failure {
    if let Some(token) = token.filter(|t| t.is_cancelled()) {
        return Failure::cancelled(token.reason());
    }

    match outcome {
        RawOutcome::Failure(failure) => failure,
        RawOutcome::Aborted(AbortReason::Cancelled) => Failure::cancelled(None),
        RawOutcome::Aborted(AbortReason::Timeout(after)) => {
            Failure::timeout(format!("no response within {} ms", after.as_millis()))
        }
        RawOutcome::Transport(TransportError::Timeout(msg)) => Failure::timeout(msg.clone()),
        RawOutcome::Response { status, body } => match FailureKind::from_http_status(status) {
            Some(_) => {
                let (message, code) = error_details(status, body);
                Failure::from_status(status, message, code)
            }
            None => Failure::api(
                Some(status),
                format!("unexpected success status {} in failure path", status),
            ),
        },
        RawOutcome::Transport(TransportError::Connect(msg)) => Failure::network(msg.clone()),
        RawOutcome::Transport(err) => {
            if NETWORK_UNREACHABLE.is_match(err.message()) {
                Failure::network(err.message())
            } else {
                Failure::api(None, err.message())
            }
        }
    }
}

/// Extract a human-readable message and an optional machine code from an error body.
///
/// JSON bodies are searched for `message`, `error.message` or a string `error`, and for
/// `code`, `error.code` or `error.type`. Other bodies contribute their (truncated) text;
/// an empty body falls back to the status' reason phrase.
pub fn error_details(status: u16, body: &[u8]) -> (String, Option<String>) {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(body) {
        let error = json.get("error");
        let message = json
            .get("message")
            .and_then(|v| v.as_str())
            .or_else(|| error.and_then(|e| e.get("message")).and_then(|v| v.as_str()))
            .or_else(|| error.and_then(|v| v.as_str()))
            .map(|s| s.to_string());
        let code = json
            .get("code")
            .and_then(value_to_code)
            .or_else(|| error.and_then(|e| e.get("code")).and_then(value_to_code))
            .or_else(|| error.and_then(|e| e.get("type")).and_then(value_to_code));
        if let Some(message) = message {
            return (message, code);
        }
        return (reason_phrase(status), code);
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        (reason_phrase(status), None)
    } else {
        (text.chars().take(MAX_BODY_MESSAGE_CHARS).collect(), None)
    }
}

fn value_to_code(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn reason_phrase(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(|r| r.to_string())
        .unwrap_or_else(|| format!("HTTP {}", status))
}
