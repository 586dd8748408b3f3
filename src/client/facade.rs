//! The `WpClient` facade

use super::resource::Resource;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{
    ApiResponse, ReqwestTransport, RequestDescriptor, RequestExecutor, RequestHook,
    RequestOptions, Transport,
};
use crate::stats::StatsSnapshot;
use crate::types::{JsonValue, Method};
use std::sync::Arc;
use tracing::{debug, info};

const AUTHORIZATION: &str = "Authorization";

/// WordPress REST API client
#[derive(Debug)]
pub struct WpClient {
    base_url: String,
    config: ClientConfig,
    executor: RequestExecutor,
}

impl WpClient {
    /// Create a client backed by reqwest
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config.user_agent)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let base_url = config
            .parsed_base_url()?
            .as_str()
            .trim_end_matches('/')
            .to_string();

        let executor = RequestExecutor::from_config(&config, transport);
        info!(
            base_url = %base_url,
            cache = config.enable_cache,
            rate_limit = config.enable_rate_limit,
            concurrency = config.request_concurrency,
            "WordPress client ready"
        );

        Ok(Self {
            base_url,
            config,
            executor,
        })
    }

    /// Create a client builder
    pub fn builder() -> WpClientBuilder {
        WpClientBuilder::default()
    }

    /// Register a request hook
    #[must_use]
    pub fn with_hook(self, hook: Arc<dyn RequestHook>) -> Self {
        Self {
            executor: self.executor.with_hook(hook),
            ..self
        }
    }

    /// Resolved base URL, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET `endpoint`
    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::GET, endpoint, None, options).await
    }

    /// POST `data` to `endpoint`
    pub async fn post(
        &self,
        endpoint: &str,
        data: JsonValue,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.request(Method::POST, endpoint, Some(data), options).await
    }

    /// PUT `data` to `endpoint`
    pub async fn put(
        &self,
        endpoint: &str,
        data: JsonValue,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.request(Method::PUT, endpoint, Some(data), options).await
    }

    /// PATCH `data` to `endpoint`
    pub async fn patch(
        &self,
        endpoint: &str,
        data: JsonValue,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.request(Method::PATCH, endpoint, Some(data), options).await
    }

    /// DELETE `endpoint`
    pub async fn delete(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::DELETE, endpoint, None, options).await
    }

    /// Helpers for the collection at `/{name}`
    pub fn resource(&self, name: &str) -> Resource<'_> {
        Resource::new(self, name)
    }

    /// Send `Authorization: Bearer <token>` on subsequent requests
    pub fn set_auth_token(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::validation("Auth token must not be empty"));
        }
        self.executor
            .set_default_header(AUTHORIZATION, format!("Bearer {token}"));
        debug!("Auth token set");
        Ok(())
    }

    /// Stop sending the auth header
    pub fn clear_auth_token(&self) {
        if self.executor.remove_default_header(AUTHORIZATION).is_some() {
            debug!("Auth token cleared");
        }
    }

    /// Drop every cached response
    pub fn clear_cache(&self) {
        if let Some(cache) = self.executor.cache() {
            let dropped = cache.len();
            cache.clear();
            debug!(dropped, "Cache cleared");
        }
    }

    /// Number of cached responses
    pub fn cache_len(&self) -> usize {
        self.executor.cache().map_or(0, |cache| cache.len())
    }

    /// Reject every request still waiting for a dispatch slot
    pub fn cancel_queued(&self) -> usize {
        self.executor.queue().clear()
    }

    /// Request counters
    pub fn stats(&self) -> StatsSnapshot {
        self.executor.stats().snapshot()
    }

    /// Zero the request counters
    pub fn reset_stats(&self) {
        self.executor.stats().reset();
    }

    pub(crate) async fn request(
        &self,
        method: Method,
        endpoint: &str,
        data: Option<JsonValue>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let RequestOptions {
            schema,
            response_schema,
            cache,
            cache_ttl,
            validate,
            params,
            headers,
            timeout,
            retries,
        } = options;

        let mut descriptor = RequestDescriptor::new(
            method,
            self.build_url(endpoint),
            timeout.unwrap_or(self.config.timeout),
        );
        let request_id = descriptor.request_id;

        let body = match (schema, data) {
            (Some(schema), data) if method.has_body() => {
                let input = data.unwrap_or(JsonValue::Null);
                let checked = schema.validate(&input).map_err(|violation| {
                    Error::validation(format!(
                        "Request body failed schema '{}': {violation}",
                        schema.name()
                    ))
                    .with_request_id(request_id)
                    .with_details(serde_json::json!({ "violation": violation }))
                })?;
                Some(checked)
            }
            (_, data) => data,
        };

        descriptor.params = params;
        descriptor.headers = headers;
        descriptor.body = body;
        descriptor.retry_budget = retries.unwrap_or(self.config.retry_count);
        descriptor.cacheable = method == Method::GET && cache != Some(false);
        descriptor.cache_ttl = cache_ttl;
        descriptor.response_schema = response_schema;
        descriptor.validate = validate;

        debug!(%request_id, %method, url = %descriptor.url, "Dispatching request");
        self.executor.execute(descriptor).await
    }

    /// Resolve an endpoint against the base URL; absolute URLs pass through
    pub(crate) fn build_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }

        let path = endpoint.trim_start_matches('/');
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

/// Builder for [`WpClient`]
#[derive(Default)]
pub struct WpClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    hooks: Vec<Arc<dyn RequestHook>>,
}

impl WpClientBuilder {
    /// Use this configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Use a custom transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Register a hook
    pub fn hook(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<WpClient> {
        let client = match self.transport {
            Some(transport) => WpClient::with_transport(self.config, transport)?,
            None => WpClient::new(self.config)?,
        };
        Ok(self
            .hooks
            .into_iter()
            .fold(client, |client, hook| client.with_hook(hook)))
    }
}
