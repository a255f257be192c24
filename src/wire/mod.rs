//! Vendor-facing types: the OpenAI-style chat-completions schema.
//!
//! These mirror the JSON on the wire. Fields the vendor may omit are
//! `Option`/defaulted, and shapes that vary (`content` as a string or as an
//! array of typed parts) are untagged enums normalised by [`MessageContent::texts`]
//! before anything reaches the host types.

mod request;
mod response;

use serde::{Deserialize, Serialize};

pub use request::{
    ChatCompletionRequest, ChatMessage, FunctionDefinition, NamedFunction, NamedToolChoice,
    ThinkingParam, ThinkingType, ToolChoiceMode, WebSearchParams, WireFunctionCall, WireTool,
    WireToolCall, WireToolChoice,
};
pub use response::{
    ChatCompletionChunk, ChatCompletionResponse, Choice, ChunkChoice, CompletionTokensDetails,
    Delta, FunctionDelta, PromptTokensDetails, ResponseMessage, ToolCallDelta, WireUsage,
};

/// Message content: a bare string or a list of typed parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentBlock>),
}

impl MessageContent {
    /// Build content from text fragments, using the bare-string form for one.
    pub fn from_texts(mut texts: Vec<String>) -> Self {
        if texts.len() == 1 {
            MessageContent::Text(texts.remove(0))
        } else {
            MessageContent::Parts(
                texts
                    .into_iter()
                    .map(|text| ContentBlock::Text { text })
                    .collect(),
            )
        }
    }

    /// Non-empty text fragments in order. Non-text blocks are skipped.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            MessageContent::Text(text) if text.is_empty() => Vec::new(),
            MessageContent::Text(text) => vec![text.as_str()],
            MessageContent::Parts(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } if !text.is_empty() => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }
}

/// A typed content part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// Any part type this adapter does not translate (images, files)
    #[serde(other)]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_accepts_string_or_parts() {
        let text: MessageContent = serde_json::from_value(json!("hello")).unwrap();
        assert_eq!(text.texts(), vec!["hello"]);

        let parts: MessageContent = serde_json::from_value(json!([
            {"type": "text", "text": "a"},
            {"type": "image_url", "image_url": {"url": "x"}},
            {"type": "text", "text": "b"}
        ]))
        .unwrap();
        assert_eq!(parts.texts(), vec!["a", "b"]);
    }

    #[test]
    fn empty_string_has_no_fragments() {
        assert!(MessageContent::Text(String::new()).texts().is_empty());
    }

    #[test]
    fn from_texts_picks_shape() {
        assert_eq!(
            MessageContent::from_texts(vec!["one".into()]),
            MessageContent::Text("one".into())
        );
        let many = MessageContent::from_texts(vec!["a".into(), "b".into()]);
        assert_eq!(
            serde_json::to_value(&many).unwrap(),
            json!([{"type": "text", "text": "a"}, {"type": "text", "text": "b"}])
        );
    }
}
