//! Collection helpers

use super::facade::WpClient;
use crate::error::{Error, Result};
use crate::http::{ApiResponse, RequestOptions};
use crate::types::{JsonValue, Method};
use std::fmt::Display;
use tracing::debug;

/// Page size used by [`Resource::list_all`] when none is given
pub const DEFAULT_PER_PAGE: u32 = 100;

/// A REST collection such as `posts` or `users`
#[derive(Debug, Clone)]
pub struct Resource<'a> {
    client: &'a WpClient,
    name: String,
}

impl<'a> Resource<'a> {
    pub(crate) fn new(client: &'a WpClient, name: &str) -> Self {
        Self {
            client,
            name: name.trim_matches('/').to_string(),
        }
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn item_path(&self, id: impl Display) -> String {
        format!("{}/{id}", self.name)
    }

    /// GET `/{name}`
    pub async fn list(&self, options: RequestOptions) -> Result<ApiResponse> {
        self.client.get(&self.name, options).await
    }

    /// GET `/{name}/{id}`
    pub async fn get(&self, id: impl Display, options: RequestOptions) -> Result<ApiResponse> {
        self.client.get(&self.item_path(id), options).await
    }

    /// POST `/{name}`
    pub async fn create(&self, data: JsonValue, options: RequestOptions) -> Result<ApiResponse> {
        self.client.post(&self.name, data, options).await
    }

    /// PUT `/{name}/{id}`
    pub async fn update(
        &self,
        id: impl Display,
        data: JsonValue,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.client.put(&self.item_path(id), data, options).await
    }

    /// DELETE `/{name}/{id}`, bypassing the trash unless `force` is given
    pub async fn delete(&self, id: impl Display, mut options: RequestOptions) -> Result<ApiResponse> {
        options
            .params
            .entry("force".to_string())
            .or_insert_with(|| "true".to_string());
        self.client
            .request(Method::DELETE, &self.item_path(id), None, options)
            .await
    }

    /// Walk every page of the collection and collect the items.
    ///
    /// Stops at `X-WP-TotalPages` when the server sends it, otherwise at the
    /// first short or empty page.
    pub async fn list_all(&self, options: RequestOptions) -> Result<Vec<JsonValue>> {
        let per_page = match options.params.get("per_page") {
            Some(value) => value
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    Error::validation(format!("per_page must be a positive integer, got '{value}'"))
                })?,
            None => DEFAULT_PER_PAGE,
        };

        let mut items = Vec::new();
        let mut page: u64 = 1;
        loop {
            let response = self
                .list(
                    options
                        .clone()
                        .param("page", page)
                        .param("per_page", per_page),
                )
                .await?;

            let batch = match response.data {
                JsonValue::Array(batch) => batch,
                other => {
                    return Err(Error::parse(format!(
                        "Expected an array page from '{}', got {other}",
                        self.name
                    ))
                    .with_request_id(response.request_id))
                }
            };
            let fetched = batch.len();
            items.extend(batch);
            debug!(resource = %self.name, page, fetched, "Fetched page");

            let done = match response.headers.total_pages {
                Some(total) => page >= total,
                None => fetched < per_page as usize,
            };
            if done || fetched == 0 {
                return Ok(items);
            }
            page += 1;
        }
    }
}
