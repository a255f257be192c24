//! Tool types for function calling

use serde::{Deserialize, Serialize};

/// A tool the model may use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    /// Host-defined functions
    Functions {
        declarations: Vec<FunctionDeclaration>,
    },
    /// The host's built-in web search tool
    WebSearch,
}

impl Tool {
    pub fn functions(declarations: Vec<FunctionDeclaration>) -> Self {
        Tool::Functions { declarations }
    }
}

/// Function definition for function calling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON schema of the arguments object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

impl FunctionDeclaration {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Some(parameters),
        }
    }
}

/// Tool-use policy for a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_calling_config: Option<FunctionCallingConfig>,
}

impl ToolConfig {
    pub fn mode(mode: FunctionCallingMode) -> Self {
        Self {
            function_calling_config: Some(FunctionCallingConfig {
                mode,
                allowed_function_names: Vec::new(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallingConfig {
    #[serde(default)]
    pub mode: FunctionCallingMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_function_names: Vec<String>,
}

/// How the model may call functions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionCallingMode {
    #[default]
    #[serde(rename = "MODE_UNSPECIFIED")]
    Unspecified,
    Auto,
    /// The model must call a function
    Any,
    None,
    /// Calls are validated against the schema before being returned
    Validated,
}
