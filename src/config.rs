//! Settings loading.
//!
//! Settings are read from a TOML file with the following resolution order:
//! 1. `--config <path>` (CLI flag; must exist)
//! 2. `~/.bifrost/config.toml` (user)
//! 3. none: built-in defaults
//!
//! The API key is taken from the file's `api_key`, else `BIFROST_API_KEY`,
//! else `GLM_API_KEY`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::generator::{AdapterConfig, AuthMode, Bifrost};
use crate::{BifrostError, Result};

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["BIFROST_API_KEY", "GLM_API_KEY"];

/// Adapter settings as written in `config.toml`.
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub api_key: Option<String>,
    /// Default model identifier.
    pub model: Option<String>,
    /// Endpoint override (base URL or full chat-completions URL).
    pub endpoint: Option<String>,
    /// Never request reasoning.
    pub disable_thinking: bool,
    /// Drop reasoning from prior turns (default: true).
    pub clear_thinking: Option<bool>,
    pub user_agent: Option<String>,
    /// Transport deadline per HTTP attempt; unset means none.
    pub timeout_secs: Option<u64>,
    /// Active authentication mode (default: `glm`).
    pub auth_mode: Option<AuthMode>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("disable_thinking", &self.disable_thinking)
            .field("clear_thinking", &self.clear_thinking)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .field("auth_mode", &self.auth_mode)
            .finish()
    }
}

impl Settings {
    /// Load settings from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                debug!("no settings file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load settings from one file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BifrostError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        let settings: Settings = toml::from_str(&content).map_err(|e| {
            BifrostError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })?;
        if settings.api_key.is_some() {
            check_permissions(path);
        }
        Ok(settings)
    }

    fn resolve_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(BifrostError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        Ok(dirs::home_dir()
            .map(|home| home.join(".bifrost").join("config.toml"))
            .filter(|path| path.exists()))
    }

    /// API key from the file, falling back to the environment.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    fn api_key_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| API_KEY_ENV_VARS.iter().find_map(|&name| env(name)))
            .filter(|key| !key.trim().is_empty())
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode.unwrap_or(AuthMode::Glm)
    }

    /// Turn the settings into a builder; callers may override further.
    pub fn adapter_config(&self) -> AdapterConfig {
        let mut config = Bifrost::builder().disable_thinking(self.disable_thinking);
        if let Some(key) = self.api_key() {
            config = config.api_key(key);
        }
        if let Some(model) = &self.model {
            config = config.model(model);
        }
        if let Some(endpoint) = &self.endpoint {
            config = config.endpoint(endpoint);
        }
        if let Some(clear) = self.clear_thinking {
            config = config.clear_thinking(clear);
        }
        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.timeout(secs);
        }
        config
    }
}

/// Warn when a file holding a key is readable by group or others.
#[cfg(unix)]
fn check_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode & 0o777),
                "config file contains an API key but is readable by others; use 0600"
            );
        }
    }
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_full_settings() {
        let toml = r#"
            api_key = "from-file"
            model = "glm-4.5-air"
            endpoint = "http://localhost:8080/v4"
            disable_thinking = true
            clear_thinking = false
            timeout_secs = 30
            auth_mode = "glm"
        "#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.model.as_deref(), Some("glm-4.5-air"));
        assert!(settings.disable_thinking);
        assert_eq!(settings.clear_thinking, Some(false));
        assert_eq!(settings.timeout_secs, Some(30));
        assert_eq!(settings.auth_mode(), AuthMode::Glm);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert!(!settings.disable_thinking);
        assert!(settings.endpoint.is_none());
        assert_eq!(settings.auth_mode(), AuthMode::Glm);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Settings>("clear_thoughts = true").is_err());
    }

    #[test]
    fn api_key_env_fallback_order() {
        let settings = Settings::default();
        let env = |name: &str| match name {
            "BIFROST_API_KEY" => None,
            "GLM_API_KEY" => Some("glm-key".to_string()),
            _ => None,
        };
        assert_eq!(settings.api_key_with(env), Some("glm-key".to_string()));

        let both = |name: &str| Some(format!("{name}-value"));
        assert_eq!(
            settings.api_key_with(both),
            Some("BIFROST_API_KEY-value".to_string())
        );

        let with_file = Settings {
            api_key: Some("from-file".into()),
            ..Default::default()
        };
        assert_eq!(with_file.api_key_with(both), Some("from-file".to_string()));
    }

    #[test]
    fn load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model = \"glm-4.6\"\nendpoint = \"http://127.0.0.1:1\"").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.model.as_deref(), Some("glm-4.6"));
        assert_eq!(settings.endpoint.as_deref(), Some("http://127.0.0.1:1"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, BifrostError::Configuration(_)));
    }

    #[test]
    fn debug_hides_api_key() {
        let settings = Settings {
            api_key: Some("secret-token".into()),
            ..Default::default()
        };
        assert!(!format!("{settings:?}").contains("secret-token"));
    }
}
