//! Request hooks
//!
//! Hooks are passed explicitly to the executor and run in registration
//! order. They see every outgoing attempt, every successful response, and
//! every lifecycle transition of a logical request.

use super::transport::{TransportRequest, TransportResponse};
use crate::error::ErrorKind;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Lifecycle state of a logical request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// Descriptor built, nothing dispatched yet
    Init,
    /// Looking up the response cache
    CacheCheck,
    /// Waiting for a queue slot
    Queued,
    /// Waiting for a rate-limiter token
    RateLimitWait,
    /// Transport call in progress (attempt 0 is the first try)
    InFlight { attempt: u32 },
    /// Response received, applying schema checks
    Validating,
    /// Waiting `delay` before attempt number `attempt`
    Retrying { attempt: u32, delay: Duration },
    /// Resolved successfully
    Succeeded { from_cache: bool },
    /// Rejected with an error of this kind
    Failed { kind: ErrorKind },
}

impl RequestState {
    /// Whether the request has settled
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::CacheCheck => write!(f, "cache_check"),
            Self::Queued => write!(f, "queued"),
            Self::RateLimitWait => write!(f, "rate_limit_wait"),
            Self::InFlight { attempt } => write!(f, "in_flight(attempt={attempt})"),
            Self::Validating => write!(f, "validating"),
            Self::Retrying { attempt, delay } => {
                write!(f, "retrying(attempt={attempt}, delay={delay:?})")
            }
            Self::Succeeded { from_cache } => write!(f, "succeeded(cached={from_cache})"),
            Self::Failed { kind } => write!(f, "failed({kind})"),
        }
    }
}

/// Pre-send / post-receive interceptor
pub trait RequestHook: Send + Sync {
    /// Called before each attempt is handed to the transport
    fn before_send(&self, _request_id: Uuid, _request: &mut TransportRequest) {}

    /// Called for each successful transport response
    fn after_receive(&self, _request_id: Uuid, _response: &TransportResponse) {}

    /// Called on every state transition
    fn on_transition(&self, _request_id: Uuid, _state: &RequestState) {}
}

/// Injects a fixed set of headers into every attempt, without overriding
/// headers the call already set
#[derive(Debug, Clone, Default)]
pub struct HeaderInjector {
    headers: Vec<(String, String)>,
}

impl HeaderInjector {
    /// Create an empty injector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl RequestHook for HeaderInjector {
    fn before_send(&self, _request_id: Uuid, request: &mut TransportRequest) {
        for (name, value) in &self.headers {
            request
                .headers
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }
}
