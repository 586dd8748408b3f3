//! Error types for the WordPress REST client
//!
//! Every failure surfaced by the client is an [`Error`] carrying exactly one
//! [`ErrorKind`], the id of the logical request it belongs to, and the time
//! it was constructed. Transport failures are classified once, at the point
//! of detection, by [`Error::from_transport`].

use crate::http::{TransportError, TransportErrorKind};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Boxed error used as the underlying cause of an [`Error`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Machine-readable error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Connection aborted or no response received
    Network,
    /// The transport gave up waiting for a response
    Timeout,
    /// Response body could not be decoded
    Parse,
    /// Input or response failed a schema or range check
    Validation,
    /// 401 / 403 responses
    Auth,
    /// 429 responses
    RateLimit,
    /// Missing or malformed client configuration
    Config,
    /// Request cancelled before it completed
    Abort,
    /// Any other failure, including unexpected HTTP statuses
    Unknown,
}

impl ErrorKind {
    /// Stable name of the kind, as used in logs and serialized errors
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "NetworkError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Auth => "AuthError",
            ErrorKind::RateLimit => "RateLimitError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Abort => "AbortError",
            ErrorKind::Unknown => "UnknownError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The main error type for the client
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    http_status: Option<u16>,
    details: Option<Value>,
    #[source]
    cause: Option<BoxError>,
    request_id: Uuid,
    timestamp: DateTime<Utc>,
}

impl Error {
    /// Create an error of the given kind with a fresh request id
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
            details: None,
            cause: None,
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    /// Create an abort error
    pub fn abort(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Abort, message)
    }

    /// Attach the id of the logical request this error belongs to
    #[must_use]
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Attach the HTTP status that produced this error
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Attach structured details (response body, schema violations, ...)
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Classify a transport failure into exactly one error kind.
    ///
    /// Priority: network, timeout, cancellation, decode, then the response
    /// status (401/403 auth, 429 rate limit, anything else unknown).
    pub fn from_transport(failure: TransportError, request_id: Uuid) -> Self {
        let TransportError {
            kind,
            message,
            response,
            source,
        } = failure;

        let mut error = match kind {
            TransportErrorKind::ConnectionAborted | TransportErrorKind::NoResponse => {
                Self::new(ErrorKind::Network, message)
            }
            TransportErrorKind::Timeout => Self::new(ErrorKind::Timeout, message),
            TransportErrorKind::Cancelled => Self::new(ErrorKind::Abort, message),
            TransportErrorKind::Decode => Self::new(ErrorKind::Parse, message),
            TransportErrorKind::InvalidRequest => Self::new(ErrorKind::Config, message),
            TransportErrorKind::Status | TransportErrorKind::Other => match &response {
                Some(resp) => {
                    let kind = match resp.status {
                        401 | 403 => ErrorKind::Auth,
                        429 => ErrorKind::RateLimit,
                        _ => ErrorKind::Unknown,
                    };
                    Self::new(kind, status_message(resp.status, &resp.status_text, &resp.data))
                }
                None => Self::new(ErrorKind::Unknown, message),
            },
        };

        if let Some(resp) = response {
            error.http_status = Some(resp.status);
            let mut details = serde_json::json!({ "body": resp.data });
            if let Some(retry_after) = resp.headers.get("retry-after") {
                details["retry_after"] = Value::String(retry_after.clone());
            }
            error.details = Some(details);
        }
        error.cause = source;
        error.request_id = request_id;
        error
    }

    /// Error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status, when the failure came from a response
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// Structured details
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Id correlating this error with the logical request across retries
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Construction time
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Construction time as an ISO-8601 string
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Network | ErrorKind::Timeout)
            || self.http_status.is_some_and(is_retryable_status)
    }

    /// Serializable view of the error, for logs and CLI output
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "kind": self.kind,
            "name": self.kind.as_str(),
            "message": self.message,
            "status": self.http_status,
            "details": self.details,
            "request_id": self.request_id,
            "timestamp": self.timestamp_iso(),
        })
    }
}

/// Check if an HTTP status code is retryable
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

fn status_message(status: u16, status_text: &str, body: &Value) -> String {
    // WordPress puts a human-readable reason in `message`
    match body.get("message").and_then(Value::as_str) {
        Some(reason) => format!("HTTP {status} {status_text}: {reason}"),
        None => format!("HTTP {status} {status_text}"),
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("Failed to parse JSON: {err}")).with_cause(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config(format!("Failed to parse YAML: {err}")).with_cause(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::config(format!("Invalid URL: {err}")).with_cause(err)
    }
}

/// Result type alias for the client
pub type Result<T> = std::result::Result<T, Error>;
