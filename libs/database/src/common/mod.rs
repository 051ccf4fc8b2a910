//! Utilities shared by every connector

pub mod retry;

pub use retry::{RetryConfig, retry_with_backoff};
