//! 失败类型码：封闭的失败分类及其机器可读代码。
//!
//! Failure kinds and their machine-readable codes.
//!
//! Every [`Failure`](crate::Failure) produced by the pipeline carries exactly one
//! [`FailureKind`]. Kinds fall into three categories:
//!
//! | Prefix | Category  | Kinds                                                  |
//! |--------|-----------|--------------------------------------------------------|
//! | E1xxx  | transport | `Network`, `Timeout`, `Cancelled`                      |
//! | E2xxx  | protocol  | `Unauthorized`, `Forbidden`, `NotFound`, `Server`, `Api` |
//! | E3xxx  | payload   | `Parse`, `Validation`                                  |
//!
//! ## Example
//!
//! ```rust
//! use rest_pipeline::error_code::FailureKind;
//!
//! let kind = FailureKind::from_http_status(503).unwrap();
//! assert_eq!(kind, FailureKind::Server);
//! assert_eq!(kind.code(), "E2004");
//! assert_eq!(kind.category(), "protocol");
//! assert!(FailureKind::from_http_status(204).is_none());
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// E1001: No response received (connection refused, DNS, reset)
    Network,
    /// E1002: The per-call deadline elapsed before a response arrived
    Timeout,
    /// E1003: The caller cancelled the request
    Cancelled,
    /// E2001: HTTP 401
    Unauthorized,
    /// E2002: HTTP 403
    Forbidden,
    /// E2003: HTTP 404
    NotFound,
    /// E2004: HTTP 5xx
    Server,
    /// E2005: Any other non-2xx status, or an unclassifiable outcome
    Api,
    /// E3001: A 2xx body could not be decoded
    Parse,
    /// E3002: The request could not be built (bad URL, header or body)
    Validation,
}

impl FailureKind {
    #[inline]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network => "E1001",
            Self::Timeout => "E1002",
            Self::Cancelled => "E1003",
            Self::Unauthorized => "E2001",
            Self::Forbidden => "E2002",
            Self::NotFound => "E2003",
            Self::Server => "E2004",
            Self::Api => "E2005",
            Self::Parse => "E3001",
            Self::Validation => "E3002",
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Server => "server",
            Self::Api => "api",
            Self::Parse => "parse",
            Self::Validation => "validation",
        }
    }

    /// Returns `"transport"`, `"protocol"` or `"payload"`.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Network | Self::Timeout | Self::Cancelled => "transport",
            Self::Unauthorized | Self::Forbidden | Self::NotFound | Self::Server | Self::Api => {
                "protocol"
            }
            Self::Parse | Self::Validation => "payload",
        }
    }

    /// Whether a caller may reasonably try the same request again.
    ///
    /// Informational only: automatic retries are driven by the retry interceptor's
    /// status set, not by this flag.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Server)
    }

    /// Maps an HTTP status to its failure kind. 2xx statuses have none.
    pub fn from_http_status(status: u16) -> Option<Self> {
        let kind = match status {
            200..=299 => return None,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500..=599 => Self::Server,
            _ => Self::Api,
        };
        Some(kind)
    }

    /// Maps a standard name (e.g. `"not_found"`) back to its kind.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "network" => Self::Network,
            "timeout" => Self::Timeout,
            "cancelled" | "canceled" => Self::Cancelled,
            "unauthorized" => Self::Unauthorized,
            "forbidden" => Self::Forbidden,
            "not_found" => Self::NotFound,
            "server" => Self::Server,
            "api" => Self::Api,
            "parse" => Self::Parse,
            "validation" => Self::Validation,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
