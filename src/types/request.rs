//! Generation request and configuration types

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::content::Content;
use super::tool::{Tool, ToolConfig};

/// A host generation request: model, conversation so far, and config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model: String,
    pub contents: Vec<Content>,
    #[serde(default)]
    pub config: GenerationConfig,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            model: model.into(),
            contents,
            config: GenerationConfig::default(),
        }
    }

    pub fn config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }
}

/// Per-request generation configuration.
///
/// Every field is optional; a request carrying none of them is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_options: Option<HttpOptions>,

    /// Aborts the call when cancelled.
    #[serde(skip)]
    pub abort_signal: Option<CancellationToken>,
}

impl GenerationConfig {
    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tool_config(mut self, config: ToolConfig) -> Self {
        self.tool_config = Some(config);
        self
    }

    pub fn thinking(mut self, config: ThinkingConfig) -> Self {
        self.thinking_config = Some(config);
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.top_p = Some(p);
        self
    }

    pub fn max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    pub fn stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.stop_sequences = stop;
        self
    }

    /// Override the endpoint for this call only.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.http_options = Some(HttpOptions {
            base_url: Some(url.into()),
        });
        self
    }

    pub fn abort_signal(mut self, token: CancellationToken) -> Self {
        self.abort_signal = Some(token);
        self
    }
}

/// Host-side reasoning preferences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkingConfig {
    /// `Some(false)` means the host explicitly does not want thoughts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_thoughts: Option<bool>,
    /// A budget of zero also turns reasoning off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<i32>,
}

impl ThinkingConfig {
    /// Config that explicitly asks for no thoughts.
    pub fn no_thoughts() -> Self {
        Self {
            include_thoughts: Some(false),
            thinking_budget: None,
        }
    }
}

/// Transport options carried on a single request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}
