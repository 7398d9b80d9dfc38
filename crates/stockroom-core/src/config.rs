//! Centralized configuration for the Stockroom search core.
//!
//! Constant groups for network and index behaviour, plus the runtime
//! connection settings for the external index service.

use crate::error::{Result, StockroomError};
use crate::network::RetryConfig;
use std::time::Duration;
use url::Url;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const MAX_RETRIES: u32 = 3;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);
    pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);
    pub const USER_AGENT: &'static str = "Stockroom-Search/0.3";
}

/// Index naming and task tracking configuration.
pub struct IndexConfig;

impl IndexConfig {
    pub const DEFAULT_INDEX_PREFIX: &'static str = "";
    pub const TASK_POLL_INTERVAL: Duration = Duration::from_secs(2);
    pub const TASK_LIST_LIMIT: u32 = 50;
    pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
    /// Attributes every index exposes for filtering, regardless of the
    /// team's custom fields.
    pub const BASE_FILTERABLE_ATTRIBUTES: &'static [&'static str] =
        &["kind", "assetTypeId", "tagIds", "createdAt", "updatedAt"];
}

/// Connection settings for the external index service.
#[derive(Debug, Clone)]
pub struct IndexServiceConfig {
    /// Base URL of the service, e.g. `http://127.0.0.1:7700`.
    pub base_url: Url,
    /// Bearer token sent with every request.
    pub api_key: Option<String>,
    /// Total timeout per request.
    pub timeout: Duration,
    /// Retry policy for retryable failures.
    pub retry: RetryConfig,
}

impl IndexServiceConfig {
    /// Create a config for the given base URL with default timeout and retry.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| StockroomError::Config {
            message: format!("Invalid index service URL '{}': {}", base_url, e),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(StockroomError::Config {
                message: format!("Index service URL '{}' cannot be a base URL", base_url),
            });
        }

        Ok(Self {
            base_url,
            api_key: None,
            timeout: NetworkConfig::REQUEST_TIMEOUT,
            retry: RetryConfig::default(),
        })
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = if key.is_empty() { None } else { Some(key) };
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Resolve a path relative to the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}
