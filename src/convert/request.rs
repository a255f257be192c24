//! Host generation request → vendor chat-completion request.

use serde_json::json;
use tracing::{debug, trace};

use crate::thinking::ThinkingPolicy;
use crate::types::{
    FunctionCallingMode, FunctionResponse, GenerationRequest, Part, Role, Tool, ToolConfig,
};
use crate::wire::{
    ChatCompletionRequest, ChatMessage, FunctionDefinition, MessageContent, NamedToolChoice,
    ToolChoiceMode, WebSearchParams, WireTool, WireToolCall, WireToolChoice,
};
use crate::{BifrostError, Result};

/// Build the vendor request body for one call.
///
/// `request_id` is stamped verbatim. `stream` selects the streaming output
/// mode. The model is copied from the request as-is; the caller fills in a
/// default when it is empty.
pub fn to_chat_request(
    request: &GenerationRequest,
    request_id: &str,
    policy: &ThinkingPolicy,
    stream: bool,
) -> Result<ChatCompletionRequest> {
    let config = &request.config;
    let mut messages = Vec::with_capacity(request.contents.len() + 1);

    if let Some(system) = config
        .system_instruction
        .as_deref()
        .filter(|s| !s.is_empty())
    {
        messages.push(ChatMessage::System {
            content: MessageContent::Text(system.to_string()),
        });
    }

    for content in &request.contents {
        match content.role {
            Role::User => push_user_turn(&mut messages, &content.parts)?,
            Role::Model => messages.push(assistant_message(&content.parts)?),
        }
    }

    let tools = to_wire_tools(&config.tools);
    // Validated even without tools so an unsupported mode is never ignored.
    let tool_choice = to_wire_tool_choice(config.tool_config.as_ref())?;
    let thinking = policy.resolve(config.thinking_config.as_ref());

    debug!(
        messages = messages.len(),
        tools = tools.len(),
        thinking = thinking.requested,
        clear_thinking = thinking.clear_prior_thinking,
        stream,
        "translated generation request"
    );

    Ok(ChatCompletionRequest {
        model: request.model.clone(),
        messages,
        tool_choice: (!tools.is_empty()).then_some(tool_choice),
        tools,
        thinking: thinking.into(),
        request_id: request_id.to_string(),
        stream: stream.then_some(true),
        temperature: config.temperature,
        top_p: config.top_p,
        max_tokens: config.max_output_tokens,
        stop: config.stop_sequences.clone(),
    })
}

/// User turns: text parts become user messages, each function response
/// becomes its own `tool` message, in part order.
fn push_user_turn(messages: &mut Vec<ChatMessage>, parts: &[Part]) -> Result<()> {
    let mut texts = Vec::new();

    for part in parts {
        match part {
            Part::Text { text } => texts.push(text.clone()),
            Part::FunctionResponse(response) => {
                flush_user_text(messages, &mut texts);
                messages.push(tool_message(response)?);
            }
            Part::Thought { .. } => {
                trace!("skipping thought part in user turn");
            }
            Part::FunctionCall(call) => {
                return Err(BifrostError::Configuration(format!(
                    "function call '{}' found in a user turn",
                    call.name
                )));
            }
            Part::InvalidFunctionCall(err) => {
                return Err(BifrostError::Configuration(format!(
                    "function call '{}' found in a user turn",
                    err.name
                )));
            }
        }
    }

    flush_user_text(messages, &mut texts);
    Ok(())
}

fn flush_user_text(messages: &mut Vec<ChatMessage>, texts: &mut Vec<String>) {
    if !texts.is_empty() {
        messages.push(ChatMessage::User {
            content: MessageContent::from_texts(std::mem::take(texts)),
        });
    }
}

fn tool_message(response: &FunctionResponse) -> Result<ChatMessage> {
    let content = match &response.response {
        serde_json::Value::String(s) => s.clone(),
        other => serde_json::to_string(other)?,
    };
    Ok(ChatMessage::Tool {
        tool_call_id: response
            .id
            .clone()
            .unwrap_or_else(|| response.name.clone()),
        content,
    })
}

/// Model turns: thoughts → `reasoning_content` (verbatim), text →
/// `content`, calls → `tool_calls`.
fn assistant_message(parts: &[Part]) -> Result<ChatMessage> {
    let mut texts = Vec::new();
    let mut reasoning = Vec::new();
    let mut tool_calls = Vec::new();

    for part in parts {
        match part {
            Part::Text { text } => texts.push(text.clone()),
            Part::Thought { text } => reasoning.push(text.clone()),
            Part::FunctionCall(call) => {
                let arguments = if call.args.is_null() {
                    "{}".to_string()
                } else {
                    serde_json::to_string(&call.args)?
                };
                let id = call.id.clone().unwrap_or_else(|| call.name.clone());
                tool_calls.push(WireToolCall::new(id, &call.name, arguments));
            }
            // Send back exactly what the model produced.
            Part::InvalidFunctionCall(err) => {
                tool_calls.push(WireToolCall::new(&err.id, &err.name, &err.arguments));
            }
            Part::FunctionResponse(response) => {
                return Err(BifrostError::Configuration(format!(
                    "function response '{}' found in a model turn",
                    response.name
                )));
            }
        }
    }

    let content = if !texts.is_empty() {
        Some(MessageContent::from_texts(texts))
    } else if tool_calls.is_empty() {
        Some(MessageContent::Text(String::new()))
    } else {
        None
    };

    Ok(ChatMessage::Assistant {
        content,
        reasoning_content: (!reasoning.is_empty()).then(|| MessageContent::from_texts(reasoning)),
        tool_calls,
    })
}

fn to_wire_tools(tools: &[Tool]) -> Vec<WireTool> {
    let mut wire = Vec::new();
    for tool in tools {
        match tool {
            Tool::Functions { declarations } => {
                wire.extend(declarations.iter().map(|decl| WireTool::Function {
                    function: FunctionDefinition {
                        name: decl.name.clone(),
                        description: decl.description.clone(),
                        parameters: decl
                            .parameters
                            .clone()
                            .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
                    },
                }));
            }
            Tool::WebSearch => wire.push(WireTool::WebSearch {
                web_search: WebSearchParams::default(),
            }),
        }
    }
    wire
}

fn to_wire_tool_choice(config: Option<&ToolConfig>) -> Result<WireToolChoice> {
    let Some(calling) = config.and_then(|c| c.function_calling_config.as_ref()) else {
        return Ok(WireToolChoice::Mode(ToolChoiceMode::Auto));
    };

    match calling.mode {
        FunctionCallingMode::Unspecified | FunctionCallingMode::Auto => {
            Ok(WireToolChoice::Mode(ToolChoiceMode::Auto))
        }
        FunctionCallingMode::None => Ok(WireToolChoice::Mode(ToolChoiceMode::None)),
        FunctionCallingMode::Any => match calling.allowed_function_names.as_slice() {
            [] => Ok(WireToolChoice::Mode(ToolChoiceMode::Required)),
            [name] => Ok(WireToolChoice::Named(NamedToolChoice::function(name))),
            names => Err(BifrostError::Configuration(format!(
                "tool choice restricted to {} functions is not supported; allow at most one",
                names.len()
            ))),
        },
        FunctionCallingMode::Validated => Err(BifrostError::Configuration(
            "VALIDATED function calling mode is not supported".to_string(),
        )),
    }
}
