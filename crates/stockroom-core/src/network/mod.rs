//! Network utilities for talking to the external index service.
//!
//! This module provides:
//! - Retry logic with exponential backoff and jitter
//! - A JSON HTTP client with bearer auth and service error mapping

mod client;
mod retry;

pub use client::HttpClient;
pub use retry::{retry_async, retry_async_with_hint, RetryConfig};
