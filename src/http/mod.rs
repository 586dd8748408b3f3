//! HTTP module
//!
//! Request execution with retry, caching, queuing and rate limiting.
//!
//! # Features
//!
//! - **Automatic Retries**: Exponential backoff for network, timeout and 408/429/5xx failures
//! - **Response Cache**: GET results served from an LRU store within their ttl
//! - **Bounded Dispatch**: FIFO queue caps simultaneous transport calls
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Hooks**: Pre-send / post-receive interceptors and lifecycle transitions

mod executor;
mod hooks;
mod rate_limit;
mod request;
mod response;
mod retry;
mod transport;

pub use executor::RequestExecutor;
pub use hooks::{HeaderInjector, RequestHook, RequestState};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use request::{RequestDescriptor, RequestOptions};
pub use response::{ApiResponse, WpHeaders, TOTAL_ITEMS_HEADER, TOTAL_PAGES_HEADER};
pub use retry::RetryPolicy;
pub use transport::{
    ReqwestTransport, Transport, TransportError, TransportErrorKind, TransportRequest,
    TransportResponse,
};
