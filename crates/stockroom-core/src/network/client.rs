//! HTTP client for the external index service.
//!
//! Wraps reqwest with:
//! - Bearer authentication
//! - JSON request/response handling
//! - Mapping of service error bodies to [`StockroomError::IndexService`]
//! - Retry with backoff for retryable failures, honouring `Retry-After`

use super::retry::retry_async_with_hint;
use crate::config::{IndexServiceConfig, NetworkConfig};
use crate::{Result, StockroomError};
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Error body returned by the index service.
#[derive(Debug, Clone, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// JSON HTTP client bound to one index service.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: IndexServiceConfig,
}

impl HttpClient {
    /// Create a client from service settings.
    pub fn new(config: IndexServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| StockroomError::Config {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    /// GET a JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json::<(), T>(Method::GET, path, None).await
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::POST, path, Some(body)).await
    }

    /// PATCH a JSON body and decode the JSON response.
    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(Method::PATCH, path, Some(body)).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(path);
        let timeout = self.config.timeout;

        retry_async_with_hint(
            &self.config.retry,
            || {
                let mut request = self.request(method.clone(), &url);
                if let Some(body) = body {
                    request = request.json(body);
                }
                let label = format!("{} {}", method, url);

                async move {
                    let response = request.send().await.map_err(|e| {
                        if e.is_timeout() {
                            StockroomError::Timeout(timeout)
                        } else {
                            StockroomError::Network {
                                message: format!("{} failed: {}", label, e),
                                cause: std::error::Error::source(&e).map(|s| s.to_string()),
                            }
                        }
                    })?;

                    let response = check_response_status(response).await?;
                    response.json::<T>().await.map_err(|e| StockroomError::Json {
                        message: format!("Failed to decode response of {}: {}", label, e),
                        source: None,
                    })
                }
            },
            StockroomError::is_retryable,
            StockroomError::retry_after,
        )
        .await
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!("{} {}", method, url);
        let request = self.client.request(method, url);
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

/// Turn a non-success response into an error.
async fn check_response_status(response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let service = response
            .url()
            .host_str()
            .unwrap_or("index service")
            .to_string();

        return Err(StockroomError::RateLimited {
            service,
            retry_after_secs: retry_after,
        });
    }

    let text = response.text().await.unwrap_or_default();
    let body: ServiceErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = if body.message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.message
    };

    Err(StockroomError::IndexService {
        status: status.as_u16(),
        code: body.code,
        message,
    })
}
