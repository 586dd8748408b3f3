// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! # wp-rest-client
//!
//! An async client core for the WordPress REST API.
//!
//! ## Features
//!
//! - **Error Taxonomy**: Every failure is classified into exactly one [`ErrorKind`]
//! - **Automatic Retries**: Exponential backoff for network, timeout and 408/429/5xx failures
//! - **Response Cache**: LRU + TTL cache for GET responses
//! - **Bounded Dispatch**: FIFO queue limits simultaneous requests (default 5)
//! - **Rate Limiting**: Token bucket gate in front of the transport
//! - **Schemas**: Validate request bodies before dispatch and responses after
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wp_rest_client::{ClientConfig, RequestOptions, Result, WpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::builder()
//!         .base_url("https://example.com/wp-json/wp/v2")
//!         .build();
//!     let client = WpClient::new(config)?;
//!     client.set_auth_token("secret")?;
//!
//!     let posts = client
//!         .resource("posts")
//!         .list(RequestOptions::new().param("per_page", 10))
//!         .await?;
//!     println!("{} posts total", posts.headers.total_items.unwrap_or(0));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  WpClient: get / post / put / delete / resource(name)        │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ RequestDescriptor
//! ┌──────────────────────────────┴───────────────────────────────┐
//! │  RequestExecutor                                             │
//! │  cache → queue → rate limit → transport → validate → retry   │
//! └──────────┬──────────────┬──────────────┬─────────────────────┘
//!            │              │              │
//!      CacheStore   ConcurrencyQueue   RateLimiter    Transport (reqwest)
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// LRU + TTL response cache
pub mod cache;

/// FIFO dispatch queue with bounded concurrency
pub mod queue;

/// Request execution: transport, retry, rate limiting, hooks
pub mod http;

/// Request and response schemas
pub mod schema;

/// Request counters
pub mod stats;

/// Client configuration
pub mod config;

/// The `WpClient` facade and resource helpers
pub mod client;

/// Command-line interface
pub mod cli;

/// Scripted transport and recording hook for tests
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{Resource, WpClient, WpClientBuilder};
pub use config::{CacheConfig, ClientConfig};
pub use error::{Error, ErrorKind, Result};
pub use http::{ApiResponse, RequestOptions, WpHeaders};
pub use schema::Schema;
pub use stats::StatsSnapshot;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
