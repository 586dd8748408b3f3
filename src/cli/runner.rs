//! CLI runner - executes commands

use crate::cli::commands::{BodyArgs, Cli, Commands, OutputFormat, RequestArgs};
use crate::client::WpClient;
use crate::config::ClientConfig;
use crate::http::RequestOptions;
use crate::types::JsonValue;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let client = self.client()?;

        match &self.cli.command {
            Commands::Get { endpoint, request } => {
                let response = client.get(endpoint, request_options(request)).await?;
                self.print(&response)
            }
            Commands::Post {
                endpoint,
                body,
                request,
            } => {
                let response = client
                    .post(endpoint, read_body(body)?, request_options(request))
                    .await?;
                self.print(&response)
            }
            Commands::Put {
                endpoint,
                body,
                request,
            } => {
                let response = client
                    .put(endpoint, read_body(body)?, request_options(request))
                    .await?;
                self.print(&response)
            }
            Commands::Delete { endpoint, request } => {
                let response = client.delete(endpoint, request_options(request)).await?;
                self.print(&response)
            }
            Commands::List {
                resource,
                all,
                per_page,
                request,
            } => {
                let mut options = request_options(request);
                if let Some(per_page) = per_page {
                    options = options.param("per_page", per_page);
                }
                let resource = client.resource(resource);
                if *all {
                    let items = resource.list_all(options).await?;
                    self.print(&items)
                } else {
                    let response = resource.list(options).await?;
                    self.print(&response)
                }
            }
        }
    }

    /// Client configuration from the config file, overridden by flags
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if let Some(base_url) = &self.cli.base_url {
            config.base_url = Some(base_url.clone());
        }
        Ok(config)
    }

    fn client(&self) -> Result<WpClient> {
        let config = self.client_config()?;
        let client = WpClient::new(config).context("Failed to create client")?;
        if let Some(token) = &self.cli.token {
            client.set_auth_token(token)?;
        }
        debug!(base_url = client.base_url(), "Client configured");
        Ok(client)
    }

    fn print<T: Serialize>(&self, value: &T) -> Result<()> {
        let output = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        println!("{output}");
        Ok(())
    }
}

fn request_options(args: &RequestArgs) -> RequestOptions {
    let mut options = RequestOptions::new();
    for (key, value) in &args.params {
        options = options.param(key.clone(), value);
    }
    for (key, value) in &args.headers {
        options = options.header(key.clone(), value.clone());
    }
    if let Some(retries) = args.retries {
        options = options.retries(retries);
    }
    if args.no_cache {
        options = options.cache(false);
    }
    options
}

fn read_body(args: &BodyArgs) -> Result<JsonValue> {
    let raw = match (&args.data, &args.data_file) {
        (Some(data), _) => data.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read body file {}", path.display()))?,
        (None, None) => anyhow::bail!("A request body is required (--data or --data-file)"),
    };
    serde_json::from_str(&raw).context("Request body is not valid JSON")
}
