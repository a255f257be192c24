//! HTTP transport to the vendor's chat-completions endpoint.
//!
//! [`EndpointClient`] sends one request body to the primary endpoint and, on
//! any failure (non-success status or transport error), exactly once to the
//! fallback endpoint. Both attempts carry the same body and headers. There
//! is no other retry, backoff or rate limiting.

mod endpoint;

pub use endpoint::{BASE_URL_ENV, DEFAULT_BASE_URL, Endpoints, FALLBACK_PATH};

use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use metrics::counter;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::{debug, instrument, warn};

use crate::telemetry::{FALLBACKS_TOTAL, REQUESTS_TOTAL};
use crate::wire::{ChatCompletionRequest, ChatCompletionResponse};
use crate::{BifrostError, Result};

/// Raw response body chunks of a streaming call
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Which endpoint an attempt went to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Primary,
    Fallback,
}

impl Attempt {
    pub fn as_str(self) -> &'static str {
        match self {
            Attempt::Primary => "primary",
            Attempt::Fallback => "fallback",
        }
    }
}

/// Authenticated client for one vendor account.
#[derive(Clone)]
pub struct EndpointClient {
    http: reqwest::Client,
    api_key: String,
    user_agent: String,
    endpoints: Endpoints,
}

impl std::fmt::Debug for EndpointClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointClient")
            .field("api_key", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl EndpointClient {
    pub fn new(
        http: reqwest::Client,
        api_key: impl Into<String>,
        user_agent: impl Into<String>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            user_agent: user_agent.into(),
            endpoints,
        }
    }

    /// Endpoints used when a call carries no override
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Endpoints for one call, honouring a per-call base URL.
    pub fn endpoints_for(&self, per_call: Option<&str>) -> Result<Endpoints> {
        match per_call.map(str::trim).filter(|s| !s.is_empty()) {
            Some(base) => Endpoints::from_base(base),
            None => Ok(self.endpoints.clone()),
        }
    }

    /// POST a non-streaming request and decode the JSON body.
    pub async fn send_json(
        &self,
        body: &ChatCompletionRequest,
        endpoints: &Endpoints,
    ) -> Result<ChatCompletionResponse> {
        let response = self.send(body, endpoints).await?;
        let endpoint = response.url().to_string();
        let text = response
            .text()
            .await
            .map_err(|e| BifrostError::transport(&endpoint, e))?;

        serde_json::from_str(&text).map_err(|e| {
            BifrostError::Protocol(format!(
                "malformed response from {endpoint}: {e}; body: {}",
                snippet(&text)
            ))
        })
    }

    /// POST a streaming request and hand back the body as it arrives.
    pub async fn send_stream(
        &self,
        body: &ChatCompletionRequest,
        endpoints: &Endpoints,
    ) -> Result<ByteStream> {
        let response = self.send(body, endpoints).await?;
        let endpoint = response.url().to_string();
        let stream = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| BifrostError::transport(&endpoint, e))
        });
        Ok(Box::pin(stream))
    }

    /// Primary, then fallback once.
    ///
    /// The fallback's error is the one returned, with the primary's failure
    /// attached to it.
    #[instrument(skip_all, fields(request_id = %body.request_id, primary = %endpoints.primary))]
    async fn send(
        &self,
        body: &ChatCompletionRequest,
        endpoints: &Endpoints,
    ) -> Result<reqwest::Response> {
        match self.attempt(&endpoints.primary, body, Attempt::Primary).await {
            Ok(response) => Ok(response),
            Err(primary_error) => {
                warn!(
                    fallback = %endpoints.fallback,
                    error = %primary_error,
                    "primary endpoint failed, trying fallback"
                );
                counter!(FALLBACKS_TOTAL).increment(1);
                self.attempt(&endpoints.fallback, body, Attempt::Fallback)
                    .await
                    .map_err(|fallback_error| fallback_error.with_primary(primary_error))
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        body: &ChatCompletionRequest,
        attempt: Attempt,
    ) -> Result<reqwest::Response> {
        let accept = if body.stream == Some(true) {
            "text/event-stream"
        } else {
            "application/json"
        };

        let result = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, accept)
            .json(body)
            .send()
            .await;

        let outcome = match result {
            Err(e) => Err(BifrostError::transport(url, e)),
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
                Err(BifrostError::Upstream {
                    endpoint: url.to_string(),
                    status,
                    body,
                    primary: None,
                })
            }
        };

        let status = if outcome.is_ok() { "ok" } else { "error" };
        counter!(REQUESTS_TOTAL, "endpoint" => attempt.as_str(), "status" => status).increment(1);
        debug!(endpoint = attempt.as_str(), url, status, "vendor attempt finished");

        outcome
    }
}

/// At most 200 characters of `text`, for error messages.
pub(crate) fn snippet(text: &str) -> String {
    const MAX: usize = 200;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(MAX).collect();
        cut.push('…');
        cut
    }
}
