//! Endpoint resolution: primary URL and its derived fallback.

use reqwest::Url;

use crate::{BifrostError, Result};

/// Default vendor base URL
pub const DEFAULT_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";

/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "GLM_BASE_URL";

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Path of the coding-plan endpoint, tried once when the primary fails
pub const FALLBACK_PATH: &str = "/api/coding/paas/v4/chat/completions";

/// The pair of URLs a call may use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub primary: String,
    pub fallback: String,
}

impl Endpoints {
    /// Resolve from the first non-empty of: per-call override, configured
    /// endpoint, `GLM_BASE_URL`, built-in default.
    pub fn resolve(per_call: Option<&str>, configured: Option<&str>) -> Result<Self> {
        let env = std::env::var(BASE_URL_ENV).ok();
        Self::resolve_with(per_call, configured, env.as_deref())
    }

    /// Same as [`Endpoints::resolve`] with the environment value passed in.
    pub fn resolve_with(
        per_call: Option<&str>,
        configured: Option<&str>,
        env: Option<&str>,
    ) -> Result<Self> {
        let base = [per_call, configured, env]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);
        Self::from_base(base)
    }

    /// Build from a base URL or a full chat-completions URL.
    pub fn from_base(base: &str) -> Result<Self> {
        let primary = chat_completions_url(base);
        let url = Url::parse(&primary).map_err(|e| {
            BifrostError::Configuration(format!("invalid endpoint '{primary}': {e}"))
        })?;
        if url.cannot_be_a_base() {
            return Err(BifrostError::Configuration(format!(
                "invalid endpoint '{primary}': not a hierarchical URL"
            )));
        }
        let fallback = url.join(FALLBACK_PATH).map_err(|e| {
            BifrostError::Configuration(format!("cannot derive fallback from '{primary}': {e}"))
        })?;

        Ok(Self {
            primary,
            fallback: fallback.to_string(),
        })
    }
}

fn chat_completions_url(base: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    if base.ends_with(CHAT_COMPLETIONS_PATH) {
        base.to_string()
    } else {
        format!("{base}{CHAT_COMPLETIONS_PATH}")
    }
}
