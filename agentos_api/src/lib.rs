//! HTTP service client for the AgentOS backend REST API.
//!
//! Builds list queries, issues requests, and normalizes the several response
//! envelopes the backend services use into a single [`types::Page`] shape.

mod client;
mod errors;
mod query;
pub mod types;
pub use self::client::Client;
pub use self::errors::Error;
pub use self::query::{PageStyle, Query, QueryCommon, ResourceQuery, SortDirection};
