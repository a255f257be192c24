//! Response and streaming event types

use serde::{Deserialize, Serialize};

use super::content::{Content, FunctionCall, Part, Role};
use crate::Result;

/// Non-streaming generation response (also the payload of a stream delta)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    /// The caller-supplied request id, echoed back unchanged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl GenerationResponse {
    /// Parts of the first candidate, in vendor order
    pub fn parts(&self) -> &[Part] {
        self.candidates
            .first()
            .map(|c| c.content.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated answer text (thoughts excluded)
    pub fn text(&self) -> String {
        self.parts().iter().filter_map(Part::as_text).collect()
    }

    /// Concatenated reasoning text
    pub fn thoughts(&self) -> String {
        self.parts().iter().filter_map(Part::as_thought).collect()
    }

    /// Function calls of the first candidate.
    ///
    /// Fails with the first part-level parse error, for callers that
    /// treat a malformed call as fatal.
    pub fn function_calls(&self) -> Result<Vec<&FunctionCall>> {
        let mut calls = Vec::new();
        for part in self.parts() {
            match part {
                Part::FunctionCall(call) => calls.push(call),
                Part::InvalidFunctionCall(err) => return Err(err.clone().into()),
                _ => {}
            }
        }
        Ok(calls)
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.candidates.first().and_then(|c| c.finish_reason)
    }
}

/// One generated alternative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub index: u32,
    pub content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl Candidate {
    pub fn new(index: u32, parts: Vec<Part>) -> Self {
        Self {
            index,
            content: Content {
                role: Role::Model,
                parts,
            },
            finish_reason: None,
        }
    }
}

/// Reason the model stopped generating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    #[default]
    #[serde(rename = "FINISH_REASON_UNSPECIFIED")]
    Unspecified,
    Stop,
    MaxTokens,
    Safety,
    Other,
}

/// Token usage statistics.
///
/// `total_token_count` is never smaller than
/// `prompt_token_count + candidates_token_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_token_count: u32,
    pub candidates_token_count: u32,
    pub thoughts_token_count: u32,
    pub tool_use_prompt_token_count: u32,
    pub cached_content_token_count: u32,
    pub total_token_count: u32,
}

/// Events emitted during streaming generation
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Newly produced parts only
    Delta(GenerationResponse),

    /// Stream complete; always the last successful event
    Finished {
        finish_reason: FinishReason,
        usage_metadata: Option<UsageMetadata>,
        response_id: Option<String>,
        model_version: Option<String>,
    },
}

impl StreamEvent {
    /// Parts carried by a delta (empty for the terminal event)
    pub fn parts(&self) -> &[Part] {
        match self {
            StreamEvent::Delta(response) => response.parts(),
            StreamEvent::Finished { .. } => &[],
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, StreamEvent::Finished { .. })
    }
}
