//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// WordPress REST API command-line client
#[derive(Parser, Debug)]
#[command(name = "wp-rest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API root, e.g. https://example.com/wp-json/wp/v2 (overrides the config file)
    #[arg(short, long, global = true)]
    pub base_url: Option<String>,

    /// Client configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Bearer token sent as the Authorization header
    #[arg(short, long, global = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// GET an endpoint
    Get {
        /// Endpoint relative to the base URL, or an absolute URL
        endpoint: String,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// POST a JSON body to an endpoint
    Post {
        /// Endpoint relative to the base URL, or an absolute URL
        endpoint: String,

        #[command(flatten)]
        body: BodyArgs,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// PUT a JSON body to an endpoint
    Put {
        /// Endpoint relative to the base URL, or an absolute URL
        endpoint: String,

        #[command(flatten)]
        body: BodyArgs,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// DELETE an endpoint
    Delete {
        /// Endpoint relative to the base URL, or an absolute URL
        endpoint: String,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// List a collection such as `posts` or `users`
    List {
        /// Collection name
        resource: String,

        /// Fetch every page
        #[arg(long)]
        all: bool,

        /// Page size
        #[arg(long)]
        per_page: Option<u32>,

        #[command(flatten)]
        request: RequestArgs,
    },
}

/// Options shared by every request command
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// Query parameter as key=value (repeatable)
    #[arg(short, long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Request header as key=value (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_key_value)]
    pub headers: Vec<(String, String)>,

    /// Override the retry budget
    #[arg(long)]
    pub retries: Option<u32>,

    /// Bypass the response cache
    #[arg(long)]
    pub no_cache: bool,
}

/// Request body source
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct BodyArgs {
    /// Inline JSON body
    #[arg(short, long)]
    pub data: Option<String>,

    /// File containing the JSON body
    #[arg(long)]
    pub data_file: Option<PathBuf>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Indented JSON
    Pretty,
}

/// Parse `key=value`
pub fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}
