//! Test doubles for the transport and hook seams
//!
//! [`ScriptedTransport`] replays a queue of canned replies and records
//! what it was asked to send. [`RecordingHook`] captures lifecycle
//! transitions so tests can assert on retry timing and request ids.

use crate::http::{
    RequestHook, RequestState, Transport, TransportError, TransportErrorKind, TransportRequest,
    TransportResponse,
};
use crate::types::JsonValue;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One canned transport outcome
#[derive(Debug, Clone)]
pub enum Reply {
    /// Resolve with this response
    Respond(TransportResponse),
    /// Reject with this non-2xx response
    Status(TransportResponse),
    /// Reject with a transport signal and no response
    Fail(TransportErrorKind),
}

impl Reply {
    /// Response with the given status and body; non-2xx statuses reject
    pub fn json(status: u16, data: JsonValue) -> Self {
        let response = TransportResponse::new(status, data);
        if response.is_success() {
            Self::Respond(response)
        } else {
            Self::Status(response)
        }
    }

    /// 200 with the given body
    pub fn ok(data: JsonValue) -> Self {
        Self::json(200, data)
    }

    /// Error status with a WordPress-style error body
    pub fn status(status: u16) -> Self {
        Self::json(
            status,
            serde_json::json!({ "code": format!("http_{status}"), "message": "scripted failure" }),
        )
    }

    /// Connection failure with no response
    pub fn network() -> Self {
        Self::Fail(TransportErrorKind::NoResponse)
    }

    /// Per-attempt timeout
    pub fn timeout() -> Self {
        Self::Fail(TransportErrorKind::Timeout)
    }

    fn resolve(self) -> Result<TransportResponse, TransportError> {
        match self {
            Self::Respond(response) => Ok(response),
            Self::Status(response) => Err(TransportError::status(response)),
            Self::Fail(kind) => Err(TransportError::new(kind, format!("scripted {kind:?}"))),
        }
    }
}

#[derive(Debug)]
struct ScriptState {
    script: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Reply>,
    requests: Mutex<Vec<TransportRequest>>,
    delay: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Transport that replays scripted replies in order, then the fallback
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    state: Arc<ScriptState>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::always(Reply::ok(serde_json::json!({})))
    }
}

impl ScriptedTransport {
    /// Transport answering `200 {}` to everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport giving the same reply to every call
    pub fn always(reply: Reply) -> Self {
        Self {
            state: Arc::new(ScriptState {
                script: Mutex::new(VecDeque::new()),
                fallback: Mutex::new(reply),
                requests: Mutex::new(Vec::new()),
                delay: Mutex::new(Duration::ZERO),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Transport replaying `replies` in order, then answering `200 {}`
    pub fn sequence(replies: impl IntoIterator<Item = Reply>) -> Self {
        let transport = Self::new();
        lock(&transport.state.script).extend(replies);
        transport
    }

    /// Queue another reply
    pub fn push(&self, reply: Reply) {
        lock(&self.state.script).push_back(reply);
    }

    /// Replace the reply used once the script runs out
    pub fn set_fallback(&self, reply: Reply) {
        *lock(&self.state.fallback) = reply;
    }

    /// Hold every call for `delay` before replying
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        *lock(&self.state.delay) = delay;
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<TransportRequest> {
        lock(&self.state.requests).clone()
    }

    /// Number of calls received so far
    pub fn calls(&self) -> usize {
        lock(&self.state.requests).len()
    }

    /// Highest number of calls observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        lock(&self.state.requests).push(request);

        let current = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = *lock(&self.state.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let reply = lock(&self.state.script)
            .pop_front()
            .unwrap_or_else(|| lock(&self.state.fallback).clone());
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply.resolve()
    }
}

/// Hook that records every transition and every attempt's request id
#[derive(Debug, Default)]
pub struct RecordingHook {
    transitions: Mutex<Vec<(Uuid, RequestState)>>,
    sent: Mutex<Vec<Uuid>>,
}

impl RecordingHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// All transitions, in order
    pub fn transitions(&self) -> Vec<(Uuid, RequestState)> {
        lock(&self.transitions).clone()
    }

    /// States only, in order
    pub fn states(&self) -> Vec<RequestState> {
        lock(&self.transitions)
            .iter()
            .map(|(_, state)| state.clone())
            .collect()
    }

    /// Delays of every `Retrying` transition
    pub fn retry_delays(&self) -> Vec<Duration> {
        lock(&self.transitions)
            .iter()
            .filter_map(|(_, state)| match state {
                RequestState::Retrying { delay, .. } => Some(*delay),
                _ => None,
            })
            .collect()
    }

    /// Request id of every attempt handed to the transport
    pub fn sent_ids(&self) -> Vec<Uuid> {
        lock(&self.sent).clone()
    }
}

impl RequestHook for RecordingHook {
    fn before_send(&self, request_id: Uuid, _request: &mut TransportRequest) {
        lock(&self.sent).push(request_id);
    }

    fn on_transition(&self, request_id: Uuid, state: &RequestState) {
        lock(&self.transitions).push((request_id, state.clone()));
    }
}
