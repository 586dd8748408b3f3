//! Transport seam and the reqwest-backed implementation
//!
//! The executor only talks to a [`Transport`]. Non-2xx responses are
//! reported as a [`TransportError`] carrying the response, so the error
//! taxonomy sees every failure in one place.

use crate::error::{BoxError, Error, Result};
use crate::types::{JsonValue, Method, StringMap};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// A single attempt, as handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Fully resolved URL
    pub url: String,
    /// Query parameters
    pub params: StringMap,
    /// JSON body
    pub body: Option<JsonValue>,
    /// Outgoing headers (defaults merged with per-call headers)
    pub headers: StringMap,
    /// Per-attempt timeout
    pub timeout: Duration,
}

/// A response received from the transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase
    pub status_text: String,
    /// Response headers, names lower-cased
    pub headers: HashMap<String, String>,
    /// Decoded JSON body (`Null` when empty)
    pub data: JsonValue,
}

impl TransportResponse {
    /// Build a response with no headers
    pub fn new(status: u16, data: JsonValue) -> Self {
        Self {
            status,
            status_text: reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or_default()
                .to_string(),
            headers: HashMap::new(),
            data,
        }
    }

    /// Add a header (name is lower-cased)
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection reset or closed mid-request
    ConnectionAborted,
    /// Request sent but nothing came back (connect failure, DNS, refused)
    NoResponse,
    /// Per-attempt timeout elapsed
    Timeout,
    /// Caller cancelled the request
    Cancelled,
    /// Body could not be decoded
    Decode,
    /// Request could not be built locally
    InvalidRequest,
    /// Response with a non-2xx status
    Status,
    /// Anything else
    Other,
}

/// Error returned by a [`Transport`]
#[derive(Debug)]
pub struct TransportError {
    /// Failure signal
    pub kind: TransportErrorKind,
    /// Description
    pub message: String,
    /// Response, when one was received
    pub response: Option<TransportResponse>,
    /// Underlying error
    pub source: Option<BoxError>,
}

impl TransportError {
    /// Create an error without a response
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            response: None,
            source: None,
        }
    }

    /// Wrap a non-2xx response
    pub fn status(response: TransportResponse) -> Self {
        Self {
            kind: TransportErrorKind::Status,
            message: format!("HTTP {}", response.status),
            response: Some(response),
            source: None,
        }
    }

    /// Timeout signal
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    /// Connection-level failure
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::NoResponse, message)
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::NoResponse
        } else if err.is_builder() {
            TransportErrorKind::InvalidRequest
        } else if err.is_decode() {
            TransportErrorKind::Decode
        } else if err.is_request() || err.is_body() {
            TransportErrorKind::ConnectionAborted
        } else {
            TransportErrorKind::Other
        };
        Self {
            kind,
            message: err.to_string(),
            response: None,
            source: Some(Box::new(err)),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportError {}

/// Promise-style request function the executor dispatches through
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one attempt
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with the given user agent
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")).with_cause(e))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut req = self
            .client
            .request(request.method.into(), &request.url)
            .timeout(request.timeout);

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.params.is_empty() {
            req = req.query(&request.params);
        }

        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(TransportError::from_reqwest)?;
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let text = response.text().await.map_err(TransportError::from_reqwest)?;

        let mut parsed = TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            data: JsonValue::Null,
        };

        if !status.is_success() {
            // Error bodies are kept even when they are not JSON
            parsed.data = if text.trim().is_empty() {
                JsonValue::Null
            } else {
                serde_json::from_str(&text).unwrap_or(JsonValue::String(text))
            };
            return Err(TransportError::status(parsed));
        }

        if !text.trim().is_empty() {
            parsed.data = serde_json::from_str(&text).map_err(|e| TransportError {
                kind: TransportErrorKind::Decode,
                message: format!("Failed to decode response body: {e}"),
                response: None,
                source: Some(Box::new(e)),
            })?;
        }

        Ok(parsed)
    }
}
