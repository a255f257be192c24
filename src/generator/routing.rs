//! Search-tool routing keyed on the active authentication mode.
//!
//! Like the rest of the routing layer this is a lookup table: under the
//! vendor auth mode the host's built-in web search is replaced by the
//! vendor's own search tool, otherwise the host keeps its integration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Tool;
use crate::{BifrostError, Result};

/// How the host is authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    GeminiApiKey,
    LoginWithGoogle,
    VertexAi,
    /// Bearer token for the vendor served by this adapter
    Glm,
}

/// Who performs a web search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchRoute {
    /// The host's default search integration
    Host,
    /// The vendor's built-in `web_search` tool
    Vendor,
}

/// Decide where the built-in search tool goes.
pub fn route_web_search(mode: AuthMode) -> SearchRoute {
    match mode {
        AuthMode::Glm => SearchRoute::Vendor,
        AuthMode::GeminiApiKey | AuthMode::LoginWithGoogle | AuthMode::VertexAi => {
            SearchRoute::Host
        }
    }
}

/// The tool to declare on requests for search, if the vendor handles it.
pub fn vendor_search_tool(mode: AuthMode) -> Option<Tool> {
    match route_web_search(mode) {
        SearchRoute::Vendor => Some(Tool::WebSearch),
        SearchRoute::Host => None,
    }
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::GeminiApiKey => "gemini-api-key",
            AuthMode::LoginWithGoogle => "login-with-google",
            AuthMode::VertexAi => "vertex-ai",
            AuthMode::Glm => "glm",
        }
    }
}

impl FromStr for AuthMode {
    type Err = BifrostError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini-api-key" => Ok(AuthMode::GeminiApiKey),
            "login-with-google" | "oauth-personal" => Ok(AuthMode::LoginWithGoogle),
            "vertex-ai" => Ok(AuthMode::VertexAi),
            "glm" | "zhipu" => Ok(AuthMode::Glm),
            other => Err(BifrostError::Configuration(format!(
                "unknown auth mode '{other}'"
            ))),
        }
    }
}
