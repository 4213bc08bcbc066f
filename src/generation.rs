use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::observability::GENERATION_DURATION;
use crate::types::{Content, GenerateContentRequest};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// The remote generation call made by the relay.
///
/// The reply is returned as raw JSON: its shape is not fixed, and
/// [`crate::extract_text`] is responsible for finding the text in it.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    /// Generate a reply to the given conversation.
    async fn generate(&self, contents: Vec<Content>) -> Result<Value>;
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: HeaderValue,
    client: ReqwestClient,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Create a new client for `model`.
    pub fn new(api_key: &str, model: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, model, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `base_url` must end in `/`; the model path is joined onto it.
    pub fn with_options(
        api_key: &str,
        model: impl Into<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(api_key)
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        api_key.set_sensitive(true);

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url: base_url.unwrap_or_else(|| crate::config::DEFAULT_API_BASE.to_string()),
            model: model.into(),
            timeout,
        })
    }

    /// Create a client from resolved server configuration.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Self::with_options(
            config.require_api_key()?,
            config.model.clone(),
            Some(config.api_base.clone()),
            None,
        )
    }

    /// The model this client generates with.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}models/{}:generateContent", self.base_url, self.model)
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("x-goog-api-key", self.api_key.clone());
        headers
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            status: Option<String>,
            message: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_type = detail.as_ref().and_then(|d| d.status.clone());
        let message = detail
            .and_then(|d| d.message)
            .unwrap_or(error_body);

        match status_code {
            401 | 403 => Error::authentication(message),
            _ => Error::api(status_code, error_type, message),
        }
    }
}

/// Stands in for the generation client when no API key is configured.
///
/// Every call fails with the configuration error, so the relay still serves its other
/// endpoints and reports the problem per chat request.
#[derive(Debug, Clone)]
pub struct UnconfiguredGenerator {
    reason: String,
}

impl UnconfiguredGenerator {
    /// Fail every call with a configuration error carrying `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl Generator for UnconfiguredGenerator {
    async fn generate(&self, _: Vec<Content>) -> Result<Value> {
        Err(Error::configuration(self.reason.clone()))
    }
}

/// The generator the relay should use for `config`.
///
/// A missing API key yields an [`UnconfiguredGenerator`]; other client construction
/// failures are returned.
pub fn generator_from_config(config: &ServerConfig) -> Result<Arc<dyn Generator>> {
    match GeminiClient::from_config(config) {
        Ok(client) => Ok(Arc::new(client)),
        Err(err) if err.is_configuration() => {
            Ok(Arc::new(UnconfiguredGenerator::new(err.message())))
        }
        Err(err) => Err(err),
    }
}

#[async_trait::async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, contents: Vec<Content>) -> Result<Value> {
        let started = Instant::now();
        let body = GenerateContentRequest { contents };

        let response = self
            .client
            .post(self.endpoint())
            .headers(self.default_headers())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let reply = response.json::<Value>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })?;
        GENERATION_DURATION.add(started.elapsed().as_secs_f64());
        Ok(reply)
    }
}
