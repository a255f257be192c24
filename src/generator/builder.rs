//! Builder for configuring generator instances

use std::time::Duration;

use super::GlmContentGenerator;
use crate::client::{EndpointClient, Endpoints};
use crate::thinking::ThinkingPolicy;
use crate::{BifrostError, Result};

/// Model used when neither the request nor the configuration names one
pub const DEFAULT_MODEL: &str = "glm-4.6";

/// Main entry point for creating generator instances.
pub struct Bifrost;

impl Bifrost {
    /// Create a new builder for configuring the generator.
    pub fn builder() -> AdapterConfig {
        AdapterConfig::new()
    }
}

/// Adapter configuration, consumed by [`AdapterConfig::build`].
#[derive(Clone, Default)]
pub struct AdapterConfig {
    api_key: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    disable_thinking: bool,
    clear_thinking: Option<bool>,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
    http_client: Option<reqwest::Client>,
}

impl std::fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("disable_thinking", &self.disable_thinking)
            .field("clear_thinking", &self.clear_thinking)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl AdapterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bearer token for the vendor.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Default model, used when a request leaves `model` empty.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Endpoint override (base URL or full chat-completions URL).
    ///
    /// Wins over `GLM_BASE_URL`; a per-call `http_options.base_url` wins
    /// over this.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Never request reasoning from the vendor.
    pub fn disable_thinking(mut self, disable: bool) -> Self {
        self.disable_thinking = disable;
        self
    }

    /// Whether the vendor should drop reasoning from prior turns (default: yes).
    pub fn clear_thinking(mut self, clear: bool) -> Self {
        self.clear_thinking = Some(clear);
        self
    }

    /// Override the `User-Agent` sent with every request.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Transport deadline for each HTTP attempt (seconds). Off by default.
    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Use a caller-provided HTTP client (shares its pool and settings).
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the generator.
    pub fn build(self) -> Result<GlmContentGenerator> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| BifrostError::Configuration("no API key configured".to_string()))?;

        let endpoints = Endpoints::resolve(None, self.endpoint.as_deref())?;

        let http = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(secs) = self.timeout_secs {
                    builder = builder.timeout(Duration::from_secs(secs));
                }
                builder.build().map_err(|e| {
                    BifrostError::Configuration(format!("failed to build HTTP client: {e}"))
                })?
            }
        };

        let user_agent = self
            .user_agent
            .unwrap_or_else(crate::version::user_agent);
        let client = EndpointClient::new(http, api_key, user_agent, endpoints);

        let mut thinking = ThinkingPolicy::new().disable_thinking(self.disable_thinking);
        thinking.clear_thinking = self.clear_thinking;

        Ok(GlmContentGenerator::new(
            client,
            self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            thinking,
        ))
    }
}
