use crate::error_code::FailureKind;
use thiserror::Error;

/// Structured error context for configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key that caused the error (e.g., "base_url", "headers.x-trace")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected form, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "client_builder", "pipeline_config")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Programmer and setup errors, reported when a client is constructed.
///
/// These never come out of a request: per-call outcomes are [`Failure`]s.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// The outcome of a request that did not succeed.
///
/// Exactly one variant is produced per completed call. Every variant carries a
/// human-readable message and, when the server supplied one, a machine code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: Option<String>,
    },

    #[error("Request timed out: {message}")]
    Timeout {
        message: String,
        code: Option<String>,
    },

    #[error("Request cancelled: {message}")]
    Cancelled {
        message: String,
        code: Option<String>,
    },

    #[error("Not found: {message}")]
    NotFound {
        message: String,
        code: Option<String>,
    },

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        code: Option<String>,
    },

    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
        code: Option<String>,
    },

    #[error("Server error: HTTP {status}: {message}")]
    Server {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("API error{}: {message}", format_status(.status))]
    Api {
        status: Option<u16>,
        message: String,
        code: Option<String>,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        code: Option<String>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: Option<String>,
    },
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!(" (HTTP {})", s),
        None => String::new(),
    }
}

impl Failure {
    pub fn network(msg: impl Into<String>) -> Self {
        Failure::Network {
            message: msg.into(),
            code: None,
        }
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Failure::Timeout {
            message: msg.into(),
            code: None,
        }
    }

    /// A cancellation failure whose message is the caller's reason, if any.
    pub fn cancelled(reason: Option<&str>) -> Self {
        Failure::Cancelled {
            message: reason.unwrap_or("request cancelled").to_string(),
            code: None,
        }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Failure::Parse {
            message: msg.into(),
            code: None,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Failure::Validation {
            message: msg.into(),
            code: None,
        }
    }

    pub fn api(status: Option<u16>, msg: impl Into<String>) -> Self {
        Failure::Api {
            status,
            message: msg.into(),
            code: None,
        }
    }

    /// Build the protocol-level failure for a non-2xx status.
    ///
    /// A 2xx status has no failure of its own and yields a generic `Api` failure.
    pub fn from_status(status: u16, message: impl Into<String>, code: Option<String>) -> Self {
        let message = message.into();
        match FailureKind::from_http_status(status) {
            Some(FailureKind::Unauthorized) => Failure::Unauthorized { message, code },
            Some(FailureKind::Forbidden) => Failure::Forbidden { message, code },
            Some(FailureKind::NotFound) => Failure::NotFound { message, code },
            Some(FailureKind::Server) => Failure::Server {
                status,
                message,
                code,
            },
            _ => Failure::Api {
                status: Some(status),
                message,
                code,
            },
        }
    }

    /// Replace the machine code.
    pub fn with_code(mut self, new_code: impl Into<String>) -> Self {
        match &mut self {
            Failure::Network { code, .. }
            | Failure::Timeout { code, .. }
            | Failure::Cancelled { code, .. }
            | Failure::NotFound { code, .. }
            | Failure::Unauthorized { code, .. }
            | Failure::Forbidden { code, .. }
            | Failure::Server { code, .. }
            | Failure::Api { code, .. }
            | Failure::Parse { code, .. }
            | Failure::Validation { code, .. } => *code = Some(new_code.into()),
        }
        self
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::Network { .. } => FailureKind::Network,
            Failure::Timeout { .. } => FailureKind::Timeout,
            Failure::Cancelled { .. } => FailureKind::Cancelled,
            Failure::NotFound { .. } => FailureKind::NotFound,
            Failure::Unauthorized { .. } => FailureKind::Unauthorized,
            Failure::Forbidden { .. } => FailureKind::Forbidden,
            Failure::Server { .. } => FailureKind::Server,
            Failure::Api { .. } => FailureKind::Api,
            Failure::Parse { .. } => FailureKind::Parse,
            Failure::Validation { .. } => FailureKind::Validation,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Failure::Network { message, .. }
            | Failure::Timeout { message, .. }
            | Failure::Cancelled { message, .. }
            | Failure::NotFound { message, .. }
            | Failure::Unauthorized { message, .. }
            | Failure::Forbidden { message, .. }
            | Failure::Server { message, .. }
            | Failure::Api { message, .. }
            | Failure::Parse { message, .. }
            | Failure::Validation { message, .. } => message,
        }
    }

    /// Machine code supplied by the server, if any. See [`FailureKind::code`] for the stable tag.
    pub fn code(&self) -> Option<&str> {
        match self {
            Failure::Network { code, .. }
            | Failure::Timeout { code, .. }
            | Failure::Cancelled { code, .. }
            | Failure::NotFound { code, .. }
            | Failure::Unauthorized { code, .. }
            | Failure::Forbidden { code, .. }
            | Failure::Server { code, .. }
            | Failure::Api { code, .. }
            | Failure::Parse { code, .. }
            | Failure::Validation { code, .. } => code.as_deref(),
        }
    }

    /// HTTP status associated with the failure, for protocol-level kinds.
    pub fn status(&self) -> Option<u16> {
        match self {
            Failure::Unauthorized { .. } => Some(401),
            Failure::Forbidden { .. } => Some(403),
            Failure::NotFound { .. } => Some(404),
            Failure::Server { status, .. } => Some(*status),
            Failure::Api { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().retryable()
    }

    /// True when no response was received (network, timeout, cancellation).
    pub fn is_transport(&self) -> bool {
        self.kind().category() == "transport"
    }
}
