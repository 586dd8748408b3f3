//! Client facade
//!
//! [`WpClient`] resolves endpoints against the configured base URL, applies
//! write-time schemas, and hands a [`crate::http::RequestDescriptor`] to the
//! executor. [`Resource`] adds WordPress collection helpers on top.

mod facade;
mod resource;

pub use facade::{WpClient, WpClientBuilder};
pub use resource::{Resource, DEFAULT_PER_PAGE};
