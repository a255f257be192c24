//! Conversation content: turns and their parts

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a user turn holding a single text part
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    /// Create a model turn from the given parts
    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    /// Create a user turn carrying function results back to the model
    pub fn function_responses(responses: Vec<FunctionResponse>) -> Self {
        Self {
            role: Role::User,
            parts: responses.into_iter().map(Part::FunctionResponse).collect(),
        }
    }
}

/// A single piece of turn content.
///
/// `Thought` is kept as its own variant so reasoning can never be read back
/// as answer text: [`Part::as_text`] returns `None` for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    /// Ordinary answer text
    Text { text: String },

    /// Reasoning ("thinking") output
    Thought { text: String },

    /// A model-emitted request to invoke a function
    FunctionCall(FunctionCall),

    /// The host's result for an earlier function call
    FunctionResponse(FunctionResponse),

    /// A function call whose arguments could not be decoded
    InvalidFunctionCall(ParseError),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn thought(text: impl Into<String>) -> Self {
        Part::Thought { text: text.into() }
    }

    pub fn function_call(
        id: impl Into<String>,
        name: impl Into<String>,
        args: serde_json::Value,
    ) -> Self {
        Part::FunctionCall(FunctionCall {
            id: Some(id.into()),
            name: name.into(),
            args,
        })
    }

    /// Whether this part is reasoning output
    pub fn is_thought(&self) -> bool {
        matches!(self, Part::Thought { .. })
    }

    /// Answer text, if this is a text part (never returns thoughts)
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Reasoning text, if this is a thought part
    pub fn as_thought(&self) -> Option<&str> {
        match self {
            Part::Thought { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match self {
            Part::FunctionCall(call) => Some(call),
            _ => None,
        }
    }
}

/// A function call made by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Decoded JSON arguments (always an object for well-formed calls)
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Result of executing a function call, opaque to the adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// Id of the call this answers; falls back to `name` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub response: serde_json::Value,
}

impl FunctionResponse {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        response: serde_json::Value,
    ) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            response,
        }
    }
}
