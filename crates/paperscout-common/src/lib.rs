//! paperscout-common — Shared types, errors, and the pooled HTTP client
//! used across all Paperscout crates.

pub mod error;
pub mod http;
pub mod text;

pub use error::PaperscoutError;
pub use http::{FetchError, HttpClient, RetryPolicy};
