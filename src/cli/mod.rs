//! CLI module
//!
//! Command-line interface for the WordPress REST client.
//!
//! # Commands
//!
//! - `get` - GET an endpoint
//! - `post` - POST a JSON body
//! - `put` - PUT a JSON body
//! - `delete` - DELETE an endpoint
//! - `list` - List a collection, optionally every page

mod commands;
mod runner;

pub use commands::{parse_key_value, BodyArgs, Cli, Commands, OutputFormat, RequestArgs};
pub use runner::Runner;
