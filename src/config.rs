//! Client configuration
//!
//! [`ClientConfig`] can be built in code with [`ClientConfig::builder`] or
//! loaded from a YAML / JSON file. Durations are written in milliseconds.

use crate::cache::{DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL};
use crate::error::{Error, Result};
use crate::queue::DEFAULT_CONCURRENCY;
use crate::types::StringMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

// ============================================================================
// Cache Config
// ============================================================================

/// Response cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached responses
    pub max_size: usize,

    /// Lifetime of a cached response
    #[serde(with = "duration_ms")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_CACHE_SIZE,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

// ============================================================================
// Client Config
// ============================================================================

/// Configuration for [`crate::WpClient`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `https://example.com/wp-json/wp/v2`
    pub base_url: Option<String>,

    /// Per-attempt timeout
    #[serde(with = "duration_ms")]
    pub timeout: Duration,

    /// Retry budget per logical request
    pub retry_count: u32,

    /// Delay before the first retry
    #[serde(with = "duration_ms")]
    pub retry_delay: Duration,

    /// Cap for any single retry delay
    #[serde(with = "duration_ms")]
    pub max_retry_delay: Duration,

    /// Growth factor between consecutive retry delays
    pub backoff_multiplier: f64,

    /// Cache successful GET responses
    pub enable_cache: bool,

    /// Cache settings
    pub cache: CacheConfig,

    /// Gate requests on a token bucket
    pub enable_rate_limit: bool,

    /// Requests allowed per interval
    pub rate_limit_requests: u32,

    /// Rate limit interval
    #[serde(with = "duration_ms")]
    pub rate_limit_interval: Duration,

    /// Maximum simultaneous in-flight requests
    pub request_concurrency: usize,

    /// Shape-check responses that have no explicit schema
    pub validate_responses: bool,

    /// Default headers for all requests
    pub headers: StringMap,

    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            retry_count: 3,
            retry_delay: Duration::from_millis(1000),
            max_retry_delay: Duration::from_millis(30_000),
            backoff_multiplier: 2.0,
            enable_cache: true,
            cache: CacheConfig::default(),
            enable_rate_limit: true,
            rate_limit_requests: 100,
            rate_limit_interval: Duration::from_secs(60),
            request_concurrency: DEFAULT_CONCURRENCY,
            validate_responses: true,
            headers: StringMap::new(),
            user_agent: format!("wp-rest-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Failed to parse config JSON: {e}")).with_cause(e))
    }

    /// Load from a file; `.json` files are read as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
                .with_cause(e)
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Parsed base URL.
    ///
    /// Fails with a config error when missing, malformed, or not http(s).
    pub fn parsed_base_url(&self) -> Result<Url> {
        let raw = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::config("Missing required config field: base_url"))?;

        let url = Url::parse(raw)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Unsupported base_url scheme '{}'",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(Error::config(format!("base_url '{raw}' has no host")));
        }
        Ok(url)
    }

    /// Check the base URL and value ranges
    pub fn validate(&self) -> Result<()> {
        self.parsed_base_url()?;

        if self.timeout.is_zero() {
            return Err(invalid("timeout", "must be greater than 0"));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(invalid("backoff_multiplier", "must be a finite number >= 1"));
        }
        if self.max_retry_delay < self.retry_delay {
            return Err(invalid("max_retry_delay", "must not be less than retry_delay"));
        }
        if self.request_concurrency == 0 {
            return Err(invalid("request_concurrency", "must be at least 1"));
        }
        if self.enable_cache {
            if self.cache.max_size == 0 {
                return Err(invalid("cache.max_size", "must be at least 1"));
            }
            if self.cache.ttl.is_zero() {
                return Err(invalid("cache.ttl", "must be greater than 0"));
            }
        }
        if self.enable_rate_limit {
            if self.rate_limit_requests == 0 {
                return Err(invalid("rate_limit_requests", "must be at least 1"));
            }
            if self.rate_limit_interval.is_zero() {
                return Err(invalid("rate_limit_interval", "must be greater than 0"));
            }
        }
        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> Error {
    Error::validation(format!("Invalid config value for '{field}': {message}"))
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retry budget
    pub fn retry_count(mut self, retries: u32) -> Self {
        self.config.retry_count = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, initial: Duration, multiplier: f64, max: Duration) -> Self {
        self.config.retry_delay = initial;
        self.config.backoff_multiplier = multiplier;
        self.config.max_retry_delay = max;
        self
    }

    /// Set the delay before the first retry
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Set the backoff multiplier
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.config.backoff_multiplier = multiplier;
        self
    }

    /// Set the cap for a single retry delay
    pub fn max_retry_delay(mut self, delay: Duration) -> Self {
        self.config.max_retry_delay = delay;
        self
    }

    /// Enable the cache with the given size and ttl
    pub fn cache(mut self, max_size: usize, ttl: Duration) -> Self {
        self.config.enable_cache = true;
        self.config.cache = CacheConfig { max_size, ttl };
        self
    }

    /// Disable the cache
    pub fn no_cache(mut self) -> Self {
        self.config.enable_cache = false;
        self
    }

    /// Enable rate limiting
    pub fn rate_limit(mut self, requests: u32, interval: Duration) -> Self {
        self.config.enable_rate_limit = true;
        self.config.rate_limit_requests = requests;
        self.config.rate_limit_interval = interval;
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.enable_rate_limit = false;
        self
    }

    /// Set the dispatch concurrency
    pub fn request_concurrency(mut self, concurrency: usize) -> Self {
        self.config.request_concurrency = concurrency;
        self
    }

    /// Enable or disable response shape checks
    pub fn validate_responses(mut self, enabled: bool) -> Self {
        self.config.validate_responses = enabled;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn valid() -> ClientConfigBuilder {
        ClientConfig::builder().base_url("https://example.com/wp-json/wp/v2")
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry_count, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(1000));
        assert_eq!(config.max_retry_delay, Duration::from_millis(30_000));
        assert!((config.backoff_multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.cache.max_size, 100);
        assert_eq!(config.cache.ttl, Duration::from_millis(300_000));
        assert_eq!(config.request_concurrency, 5);
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_builder() {
        let config = valid()
            .timeout(Duration::from_secs(5))
            .retry_count(2)
            .backoff(Duration::from_millis(100), 3.0, Duration::from_secs(2))
            .cache(10, Duration::from_millis(50))
            .rate_limit(5, Duration::from_secs(1))
            .request_concurrency(2)
            .header("X-Custom", "value")
            .user_agent("test-agent/1.0")
            .build();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry_count, 2);
        assert_eq!(config.retry_delay, Duration::from_millis(100));
        assert_eq!(config.max_retry_delay, Duration::from_secs(2));
        assert_eq!(config.cache, CacheConfig { max_size: 10, ttl: Duration::from_millis(50) });
        assert_eq!(config.rate_limit_requests, 5);
        assert_eq!(config.request_concurrency, 2);
        assert_eq!(config.headers.get("X-Custom"), Some(&"value".to_string()));
        assert_eq!(config.user_agent, "test-agent/1.0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_base_url_is_config_error() {
        let err = ClientConfig::default().validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let err = ClientConfig::builder().base_url("  ").build().validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_malformed_base_url_is_config_error() {
        for url in ["not a url", "ftp://example.com", "example.com/wp-json"] {
            let err = ClientConfig::builder().base_url(url).build().validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Config, "{url}");
        }
    }

    #[test]
    fn test_out_of_range_values_are_validation_errors() {
        let cases = vec![
            valid().timeout(Duration::ZERO).build(),
            valid().backoff_multiplier(0.5).build(),
            valid().backoff_multiplier(f64::NAN).build(),
            valid()
                .retry_delay(Duration::from_secs(5))
                .max_retry_delay(Duration::from_secs(1))
                .build(),
            valid().request_concurrency(0).build(),
            valid().cache(0, Duration::from_secs(1)).build(),
            valid().cache(10, Duration::ZERO).build(),
            valid().rate_limit(0, Duration::from_secs(1)).build(),
            valid().rate_limit(1, Duration::ZERO).build(),
            valid().user_agent("").build(),
        ];

        for config in cases {
            let err = config.validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{config:?}");
        }
    }

    #[test]
    fn test_disabled_features_skip_their_checks() {
        let config = valid()
            .cache(0, Duration::ZERO)
            .no_cache()
            .rate_limit(0, Duration::ZERO)
            .no_rate_limit()
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
base_url: "https://example.com/wp-json/wp/v2"
timeout: 5000
retry_count: 2
retry_delay: 100
backoff_multiplier: 2
cache:
  max_size: 20
  ttl: 50
enable_rate_limit: false
headers:
  X-Site: blog
"#;
        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert_eq!(config.retry_delay, Duration::from_millis(100));
        assert_eq!(config.cache.ttl, Duration::from_millis(50));
        assert_eq!(config.cache.max_size, 20);
        assert!(!config.enable_rate_limit);
        assert_eq!(config.headers.get("X-Site"), Some(&"blog".to_string()));
        // Unspecified fields keep their defaults
        assert_eq!(config.max_retry_delay, Duration::from_millis(30_000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_invalid_is_config_error() {
        let err = ClientConfig::from_yaml_str("timeout: [1, 2]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_from_file_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("client.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(file, r#"{{"base_url": "https://example.com", "retry_count": 7}}"#).unwrap();
        let config = ClientConfig::from_file(&json_path).unwrap();
        assert_eq!(config.retry_count, 7);

        let yaml_path = dir.path().join("client.yaml");
        std::fs::write(&yaml_path, "base_url: https://example.com\nrequest_concurrency: 9\n").unwrap();
        let config = ClientConfig::from_file(&yaml_path).unwrap();
        assert_eq!(config.request_concurrency, 9);

        let err = ClientConfig::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_serde_roundtrip_uses_milliseconds() {
        let config = valid().build();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout"], 30_000);
        assert_eq!(json["cache"]["ttl"], 300_000);
        let back: ClientConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
