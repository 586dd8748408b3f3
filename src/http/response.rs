//! Response types

use crate::error::{Error, Result};
use crate::types::JsonValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Header carrying the total number of items in a collection
pub const TOTAL_ITEMS_HEADER: &str = "x-wp-total";

/// Header carrying the total number of pages in a collection
pub const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";

/// Pagination totals parsed from WordPress response headers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WpHeaders {
    /// `X-WP-Total`
    pub total_items: Option<u64>,
    /// `X-WP-TotalPages`
    pub total_pages: Option<u64>,
}

impl WpHeaders {
    /// Parse from lower-cased response headers; malformed values are ignored
    pub fn from_headers(headers: &HashMap<String, String>) -> Self {
        let parse = |name: &str| headers.get(name).and_then(|v| v.trim().parse().ok());
        Self {
            total_items: parse(TOTAL_ITEMS_HEADER),
            total_pages: parse(TOTAL_PAGES_HEADER),
        }
    }
}

/// Successful result of a request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    /// Response body
    pub data: JsonValue,
    /// HTTP status
    pub status: u16,
    /// Reason phrase
    pub status_text: String,
    /// Pagination headers
    pub headers: WpHeaders,
    /// Id of the logical request
    pub request_id: Uuid,
}

impl ApiResponse {
    /// Deserialize the body into a typed value
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            Error::parse(format!("Failed to deserialize response: {e}"))
                .with_request_id(self.request_id)
                .with_cause(e)
        })
    }
}

/// What the response cache stores for a GET
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CachedResponse {
    pub data: JsonValue,
    pub status: u16,
    pub status_text: String,
    pub headers: WpHeaders,
}

impl CachedResponse {
    pub fn from_response(response: &ApiResponse) -> Self {
        Self {
            data: response.data.clone(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers,
        }
    }

    pub fn into_response(self, request_id: Uuid) -> ApiResponse {
        ApiResponse {
            data: self.data,
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            request_id,
        }
    }
}
