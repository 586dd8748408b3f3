//! Request executor
//!
//! Drives one logical request through its lifecycle:
//! cache lookup → queue admission → rate limit → transport call →
//! validation → cache store, retrying transient failures with backoff.

use super::hooks::{RequestHook, RequestState};
use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::request::RequestDescriptor;
use super::response::{ApiResponse, CachedResponse, WpHeaders};
use super::retry::RetryPolicy;
use super::transport::{Transport, TransportRequest};
use crate::cache::{cache_key, CacheStore};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::queue::ConcurrencyQueue;
use crate::stats::Stats;
use crate::types::{JsonValue, Method, StringMap};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Orchestrates cache, queue, rate limiter, transport and retries
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    cache: Option<CacheStore<CachedResponse>>,
    queue: ConcurrencyQueue,
    rate_limiter: Option<RateLimiter>,
    retry: RetryPolicy,
    hooks: Vec<Arc<dyn RequestHook>>,
    default_headers: RwLock<StringMap>,
    validate_responses: bool,
    stats: Stats,
}

impl RequestExecutor {
    /// Executor with no cache, no rate limiter, default queue and retry policy
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: None,
            queue: ConcurrencyQueue::default(),
            rate_limiter: None,
            retry: RetryPolicy::default(),
            hooks: Vec::new(),
            default_headers: RwLock::new(StringMap::new()),
            validate_responses: false,
            stats: Stats::new(),
        }
    }

    /// Executor wired from a client configuration
    pub fn from_config(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let mut executor = Self::new(transport)
            .with_concurrency(config.request_concurrency)
            .with_retry_policy(RetryPolicy::new(
                config.retry_delay,
                config.backoff_multiplier,
                config.max_retry_delay,
            ))
            .with_default_headers(config.headers.clone())
            .with_response_validation(config.validate_responses);

        if config.enable_cache {
            executor = executor.with_cache(config.cache.max_size, config.cache.ttl);
        }
        if config.enable_rate_limit {
            executor = executor.with_rate_limiter(&RateLimiterConfig::new(
                config.rate_limit_requests,
                config.rate_limit_interval,
            ));
        }
        executor
    }

    /// Enable the response cache
    #[must_use]
    pub fn with_cache(mut self, max_size: usize, ttl: Duration) -> Self {
        self.cache = Some(CacheStore::new(max_size, ttl));
        self
    }

    /// Gate every attempt on a token bucket
    #[must_use]
    pub fn with_rate_limiter(mut self, config: &RateLimiterConfig) -> Self {
        self.rate_limiter = Some(RateLimiter::new(config));
        self
    }

    /// Set the backoff policy
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Bound the number of simultaneous transport calls
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.queue = ConcurrencyQueue::new(concurrency);
        self
    }

    /// Register a hook
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Replace the default outgoing headers
    #[must_use]
    pub fn with_default_headers(self, headers: StringMap) -> Self {
        *self
            .default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner) = headers;
        self
    }

    /// Shape-check responses that have no explicit schema
    #[must_use]
    pub fn with_response_validation(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }

    /// Set a default header for subsequent requests
    pub fn set_default_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
    }

    /// Remove a default header
    pub fn remove_default_header(&self, name: &str) -> Option<String> {
        self.default_headers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Current default headers
    pub fn default_headers(&self) -> StringMap {
        self.default_headers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Request counters
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// The response cache, when enabled
    pub(crate) fn cache(&self) -> Option<&CacheStore<CachedResponse>> {
        self.cache.as_ref()
    }

    /// The dispatch queue
    pub fn queue(&self) -> &ConcurrencyQueue {
        &self.queue
    }

    /// The backoff policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Run a logical request to completion
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<ApiResponse> {
        let request_id = descriptor.request_id;
        self.stats.record_request();
        self.transition(request_id, RequestState::Init);

        let key = self.cache_key_for(&descriptor);
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            self.transition(request_id, RequestState::CacheCheck);
            if let Some(cached) = cache.get(key) {
                debug!(%request_id, url = %descriptor.url, "Cache hit");
                self.stats.record_cache_hit();
                self.stats.record_success();
                self.transition(request_id, RequestState::Succeeded { from_cache: true });
                return Ok(cached.into_response(request_id));
            }
            self.stats.record_cache_miss();
        }

        let mut current = descriptor;
        let mut attempt: u32 = 0;
        loop {
            match self.attempt(&current, attempt).await {
                Ok(response) => {
                    if let (Some(cache), Some(key)) = (&self.cache, key.as_deref()) {
                        let ttl = current.cache_ttl.unwrap_or_else(|| cache.default_ttl());
                        cache.set_with_ttl(key, CachedResponse::from_response(&response), ttl);
                    }
                    debug!(
                        %request_id,
                        method = %current.method,
                        url = %current.url,
                        status = response.status,
                        "Request succeeded"
                    );
                    self.stats.record_success();
                    self.transition(request_id, RequestState::Succeeded { from_cache: false });
                    return Ok(response);
                }
                Err(error) if error.is_retryable() && current.retry_budget > 0 => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        %request_id,
                        kind = %error.kind(),
                        "Request failed: {}, attempt {}/{}, retrying in {:?}",
                        error.message(),
                        attempt + 1,
                        attempt + current.retry_budget + 1,
                        delay
                    );
                    self.transition(
                        request_id,
                        RequestState::Retrying {
                            attempt: attempt + 1,
                            delay,
                        },
                    );
                    tokio::time::sleep(delay).await;
                    self.stats.record_retry();
                    current = current.next_attempt();
                    attempt += 1;
                }
                Err(error) => {
                    debug!(%request_id, kind = %error.kind(), "Request failed: {}", error.message());
                    self.stats.record_failure();
                    self.transition(request_id, RequestState::Failed { kind: error.kind() });
                    return Err(error);
                }
            }
        }
    }

    /// One pass through queue, rate limiter, transport and validation
    async fn attempt(&self, descriptor: &RequestDescriptor, attempt: u32) -> Result<ApiResponse> {
        let request_id = descriptor.request_id;

        self.transition(request_id, RequestState::Queued);
        let slot = self
            .queue
            .acquire()
            .await
            .map_err(|e| Error::abort(e.to_string()).with_request_id(request_id))?;

        if let Some(limiter) = &self.rate_limiter {
            self.transition(request_id, RequestState::RateLimitWait);
            limiter.wait().await;
        }

        let mut request = self.transport_request(descriptor);
        for hook in &self.hooks {
            hook.before_send(request_id, &mut request);
        }

        self.transition(request_id, RequestState::InFlight { attempt });
        let result = self.transport.send(request).await;
        drop(slot);

        let response = result.map_err(|failure| Error::from_transport(failure, request_id))?;
        for hook in &self.hooks {
            hook.after_receive(request_id, &response);
        }

        self.transition(request_id, RequestState::Validating);
        let data = self.validate_body(descriptor, response.data)?;

        Ok(ApiResponse {
            data,
            status: response.status,
            status_text: response.status_text,
            headers: WpHeaders::from_headers(&response.headers),
            request_id,
        })
    }

    fn transport_request(&self, descriptor: &RequestDescriptor) -> TransportRequest {
        let mut headers = self.default_headers();
        headers.extend(
            descriptor
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        TransportRequest {
            method: descriptor.method,
            url: descriptor.url.clone(),
            params: descriptor.params.clone(),
            body: descriptor.body.clone(),
            headers,
            timeout: descriptor.timeout,
        }
    }

    fn validate_body(&self, descriptor: &RequestDescriptor, data: JsonValue) -> Result<JsonValue> {
        let request_id = descriptor.request_id;
        let enabled = descriptor.validate.unwrap_or(true);

        if let Some(schema) = &descriptor.response_schema {
            if !enabled {
                return Ok(data);
            }
            return schema.validate(&data).map_err(|violation| {
                Error::validation(format!(
                    "Response failed schema '{}': {violation}",
                    schema.name()
                ))
                .with_request_id(request_id)
                .with_details(serde_json::json!({ "violation": violation }))
            });
        }

        if descriptor.validate.unwrap_or(self.validate_responses)
            && !(data.is_object() || data.is_array() || data.is_null())
        {
            return Err(Error::validation(format!(
                "Expected a JSON object or array, got {data}"
            ))
            .with_request_id(request_id));
        }
        Ok(data)
    }

    fn cache_key_for(&self, descriptor: &RequestDescriptor) -> Option<String> {
        if self.cache.is_none() || descriptor.method != Method::GET || !descriptor.cacheable {
            return None;
        }
        Some(cache_key(
            descriptor.method,
            &descriptor.url,
            &descriptor.params,
            descriptor.body.as_ref(),
        ))
    }

    fn transition(&self, request_id: Uuid, state: RequestState) {
        for hook in &self.hooks {
            hook.on_transition(request_id, &state);
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("cache", &self.cache)
            .field("queue", &self.queue)
            .field("rate_limiter", &self.rate_limiter)
            .field("retry", &self.retry)
            .field("hooks", &self.hooks.len())
            .field("validate_responses", &self.validate_responses)
            .finish_non_exhaustive()
    }
}

