//! # Request Pipeline
//!
//! Single choke point for API traffic. Every call is built against the API
//! base address, passed through the registered [`RequestStage`]s, executed by
//! the host [`HttpClient`], and the response handed to every
//! [`ResponseStage`] before the caller sees it.
//!
//! ```text
//! caller ──> request stages ──> HttpClient ──> response stages ──> caller
//!            (bearer token)                    (401 handling)
//! ```
//!
//! Stages run in registration order. Request stages never fail. Response
//! stages observe every received response, successful or not; a transport
//! failure produces no response and skips them.
//!
//! The pipeline knows nothing about sessions. The credential and 401 stages
//! live in [`crate::stages`] and are installed at wiring time.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_runtime::config::CoreConfig;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;

/// What response stages get to know about the request that produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    pub method: HttpMethod,
    /// Endpoint path as given by the caller, e.g. `/auth/me`.
    pub path: String,
    /// Fully resolved URL.
    pub url: String,
}

/// Hook run on every outbound request.
#[async_trait]
pub trait RequestStage: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    async fn on_request(&self, request: &mut HttpRequest);
}

/// Hook run on every received response, before it is returned to the caller.
#[async_trait]
pub trait ResponseStage: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    async fn on_response(&self, request: &RequestSummary, response: &HttpResponse);
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// `error` field of a JSON error body, if the body has a non-empty one.
pub fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.trim().is_empty())
}

/// HTTP client wrapper bound to the API base address.
///
/// Cloning is cheap; clones share the client and the stages.
///
/// # Examples
///
/// ```ignore
/// let pipeline = RequestPipeline::new(base_url, http_client)
///     .with_request_stage(Arc::new(BearerTokenStage::new(session.clone())))
///     .with_response_stage(Arc::new(unauthorized_stage));
///
/// let user: UserProfile = pipeline.get_json("/auth/me").await?;
/// ```
#[derive(Clone)]
pub struct RequestPipeline {
    base_url: Url,
    client: Arc<dyn HttpClient>,
    request_stages: Vec<Arc<dyn RequestStage>>,
    response_stages: Vec<Arc<dyn ResponseStage>>,
}

impl RequestPipeline {
    pub fn new(base_url: Url, client: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url,
            client,
            request_stages: Vec::new(),
            response_stages: Vec::new(),
        }
    }

    /// Pipeline over the configured HTTP client and API base address, with no
    /// stages installed.
    pub fn from_config(config: &CoreConfig) -> core_runtime::Result<Self> {
        Ok(Self::new(
            config.api_base_url()?,
            Arc::clone(&config.http_client),
        ))
    }

    pub fn with_request_stage(mut self, stage: Arc<dyn RequestStage>) -> Self {
        self.request_stages.push(stage);
        self
    }

    pub fn with_response_stage(mut self, stage: Arc<dyn ResponseStage>) -> Self {
        self.response_stages.push(stage);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join the base address and `path` with exactly one `/`.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", joined, e)))
    }

    /// Send a request and return the response if its status is 2xx.
    ///
    /// Response stages have already run when this returns, whatever the
    /// outcome.
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<HttpResponse, ApiError> {
        let url = self.endpoint_url(path)?;

        let mut request = HttpRequest::new(method, url.as_str())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.body(body);
        }

        for stage in &self.request_stages {
            stage.on_request(&mut request).await;
        }

        let summary = RequestSummary {
            method,
            path: path.to_string(),
            url: url.to_string(),
        };

        debug!(method = %method, path = path, "Sending API request");

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(method = %method, path = path, error = %e, "API request failed");
                return Err(ApiError::Transport(e.to_string()));
            }
        };

        for stage in &self.response_stages {
            stage.on_response(&summary, &response).await;
        }

        if response.is_success() {
            debug!(path = path, status = response.status, "API request succeeded");
            return Ok(response);
        }

        let message = error_message(&response.body);
        debug!(
            path = path,
            status = response.status,
            server_message = message.as_deref().unwrap_or(""),
            "API request rejected"
        );
        Err(ApiError::Status {
            status: response.status,
            message,
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(HttpMethod::Get, path, None).await?;
        decode(&response)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(HttpMethod::Post, path, Some(encode(body)?))
            .await?;
        decode(&response)
    }

    /// POST whose success body is ignored.
    pub async fn post_json_empty<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.send(HttpMethod::Post, path, Some(encode(body)?))
            .await
            .map(|_| ())
    }
}

impl fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let request_stages: Vec<_> = self.request_stages.iter().map(|s| s.name()).collect();
        let response_stages: Vec<_> = self.response_stages.iter().map(|s| s.name()).collect();

        f.debug_struct("RequestPipeline")
            .field("base_url", &self.base_url.as_str())
            .field("request_stages", &request_stages)
            .field("response_stages", &response_stages)
            .finish()
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Bytes, ApiError> {
    serde_json::to_vec(body)
        .map(Bytes::from)
        .map_err(|e| ApiError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_slice(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}
