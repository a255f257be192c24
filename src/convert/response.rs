//! Vendor chat-completion response → host generation response.

use serde_json::{Value, json};
use tracing::warn;

use crate::error::ParseError;
use crate::types::{
    Candidate, FinishReason, FunctionCall, GenerationResponse, Part, UsageMetadata,
};
use crate::wire::{ChatCompletionResponse, Choice, MessageContent, WireUsage};
use crate::{BifrostError, Result};

/// Translate a complete (non-streaming) response.
///
/// Parts come out as reasoning, then text, then tool calls. A tool call
/// with undecodable arguments becomes [`Part::InvalidFunctionCall`] and does
/// not fail the response.
pub fn from_chat_response(
    response: ChatCompletionResponse,
    request_id: &str,
) -> Result<GenerationResponse> {
    if response.choices.is_empty() {
        return Err(BifrostError::Protocol(
            "response contained no choices".to_string(),
        ));
    }

    let candidates = response.choices.into_iter().map(to_candidate).collect();

    Ok(GenerationResponse {
        candidates,
        usage_metadata: response.usage.as_ref().map(from_wire_usage),
        response_id: response.id,
        model_version: response.model,
        request_id: Some(request_id.to_string()),
    })
}

fn to_candidate(choice: Choice) -> Candidate {
    let message = choice.message;
    let mut parts = Vec::new();

    push_texts(&mut parts, message.reasoning_content.as_ref(), Part::thought);
    push_texts(&mut parts, message.content.as_ref(), Part::text);

    for call in message.tool_calls.unwrap_or_default() {
        parts.push(tool_call_part(
            call.id,
            call.function.name,
            &call.function.arguments,
        ));
    }

    let mut candidate = Candidate::new(choice.index, parts);
    candidate.finish_reason = Some(map_finish_reason(choice.finish_reason.as_deref()));
    candidate
}

pub(crate) fn push_texts(
    parts: &mut Vec<Part>,
    content: Option<&MessageContent>,
    make: fn(String) -> Part,
) {
    if let Some(content) = content {
        parts.extend(content.texts().into_iter().map(|t| make(t.to_string())));
    }
}

/// Decode one tool call's argument string into a function-call part.
///
/// Empty or whitespace-only arguments decode to `{}`.
pub(crate) fn tool_call_part(id: String, name: String, arguments: &str) -> Part {
    let raw = arguments.trim();
    let decoded = if raw.is_empty() {
        Ok(json!({}))
    } else {
        serde_json::from_str::<Value>(raw).map_err(|e| e.to_string())
    };

    match decoded {
        Ok(args @ Value::Object(_)) => Part::FunctionCall(FunctionCall {
            id: (!id.is_empty()).then_some(id),
            name,
            args,
        }),
        Ok(other) => invalid_call(
            id,
            name,
            arguments,
            format!("arguments must be a JSON object, got {}", json_kind(&other)),
        ),
        Err(message) => invalid_call(id, name, arguments, message),
    }
}

fn invalid_call(id: String, name: String, arguments: &str, message: String) -> Part {
    warn!(tool = %name, call_id = %id, error = %message, "tool call arguments failed to decode");
    Part::InvalidFunctionCall(ParseError {
        id,
        name,
        arguments: arguments.to_string(),
        message,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Map the vendor finish reason onto the host enumeration.
pub fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        None => FinishReason::Unspecified,
        Some("stop" | "tool_calls") => FinishReason::Stop,
        Some("length") => FinishReason::MaxTokens,
        Some("sensitive" | "content_filter") => FinishReason::Safety,
        Some(_) => FinishReason::Other,
    }
}

/// Map vendor usage onto host usage metadata.
pub fn from_wire_usage(usage: &WireUsage) -> UsageMetadata {
    let thoughts = usage
        .reasoning_tokens
        .or_else(|| {
            usage
                .completion_tokens_details
                .and_then(|d| d.reasoning_tokens)
        })
        .unwrap_or(0);
    let cached = usage
        .prompt_tokens_details
        .and_then(|d| d.cached_tokens)
        .unwrap_or(0);
    let floor = usage.prompt_tokens.saturating_add(usage.completion_tokens);

    UsageMetadata {
        prompt_token_count: usage.prompt_tokens,
        candidates_token_count: usage.completion_tokens,
        thoughts_token_count: thoughts,
        tool_use_prompt_token_count: usage.tool_tokens.unwrap_or(0),
        cached_content_token_count: cached,
        total_token_count: usage.total_tokens.max(floor),
    }
}
