//! Request descriptors and per-call options

use crate::schema::Schema;
use crate::types::{JsonValue, Method, StringMap};
use std::time::Duration;
use uuid::Uuid;

/// Options recognized on every call
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Write-time schema applied to POST/PUT bodies before dispatch
    pub schema: Option<Schema>,
    /// Schema applied to the response body
    pub response_schema: Option<Schema>,
    /// Per-call cache switch (`Some(false)` bypasses the cache)
    pub cache: Option<bool>,
    /// Override the cache ttl for this call
    pub cache_ttl: Option<Duration>,
    /// Per-call response validation switch
    pub validate: Option<bool>,
    /// Query parameters
    pub params: StringMap,
    /// Request headers
    pub headers: StringMap,
    /// Override the per-attempt timeout
    pub timeout: Option<Duration>,
    /// Override the retry budget
    pub retries: Option<u32>,
}

impl RequestOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Validate the request body with this schema
    #[must_use]
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Validate the response body with this schema
    #[must_use]
    pub fn response_schema(mut self, schema: Schema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Enable or bypass the cache for this call
    #[must_use]
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = Some(enabled);
        self
    }

    /// Cache ttl for this call
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Enable or skip response validation for this call
    #[must_use]
    pub fn validate(mut self, enabled: bool) -> Self {
        self.validate = Some(enabled);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set max retries
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }
}

/// Everything the executor needs for one logical request.
///
/// A descriptor is not mutated between attempts; a retry works on the
/// descriptor returned by [`RequestDescriptor::next_attempt`].
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Correlates every attempt and the final error
    pub request_id: Uuid,
    /// HTTP method
    pub method: Method,
    /// Fully resolved URL
    pub url: String,
    /// Query parameters
    pub params: StringMap,
    /// JSON body
    pub body: Option<JsonValue>,
    /// Per-call headers (merged over the client defaults)
    pub headers: StringMap,
    /// Retries still allowed
    pub retry_budget: u32,
    /// Whether a successful response may be served from / stored in the cache
    pub cacheable: bool,
    /// Ttl for the stored response (`None` = cache default)
    pub cache_ttl: Option<Duration>,
    /// Schema applied to the response body
    pub response_schema: Option<Schema>,
    /// Per-call validation switch (`None` = client default)
    pub validate: Option<bool>,
    /// Per-attempt timeout
    pub timeout: Duration,
}

impl RequestDescriptor {
    /// Create a descriptor with a fresh request id and no retries
    pub fn new(method: Method, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method,
            url: url.into(),
            params: StringMap::new(),
            body: None,
            headers: StringMap::new(),
            retry_budget: 0,
            cacheable: method == Method::GET,
            cache_ttl: None,
            response_schema: None,
            validate: None,
            timeout,
        }
    }

    /// Descriptor for the next attempt: same request id, one less retry
    #[must_use]
    pub fn next_attempt(&self) -> Self {
        Self {
            retry_budget: self.retry_budget.saturating_sub(1),
            ..self.clone()
        }
    }
}
