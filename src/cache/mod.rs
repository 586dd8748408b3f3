//! Response cache module
//!
//! Bounded, time-expiring key/value store for idempotent GET results.
//!
//! # Features
//!
//! - **LRU Eviction**: Least recently used entries are dropped once the store is full
//! - **TTL Expiry**: Entries older than their ttl are never returned
//! - **Deterministic Keys**: Keys hash method, URL, sorted params and body

mod store;

pub use store::{cache_key, CacheStore, DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL};
