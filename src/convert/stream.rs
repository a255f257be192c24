//! Incremental translation of streaming chunks into host events.

use tracing::trace;

use super::response::{from_wire_usage, map_finish_reason, push_texts, tool_call_part};
use crate::types::{Candidate, FinishReason, GenerationResponse, Part, StreamEvent, UsageMetadata};
use crate::wire::{ChatCompletionChunk, ToolCallDelta};

/// A tool call whose fragments are still arriving
#[derive(Debug, Default)]
struct PendingToolCall {
    index: Option<u32>,
    id: String,
    name: String,
    arguments: String,
}

/// Per-stream assembly state.
///
/// Text and reasoning fragments are forwarded as soon as they arrive. Tool
/// call fragments are buffered (keyed by call id; id-less continuations
/// fall back to `index`, then to the latest call) and released as complete function-call parts once the vendor
/// reports a finish reason, or when the stream closes. Owned by exactly one
/// stream; nothing here outlives it.
#[derive(Debug)]
pub struct StreamAssembler {
    request_id: String,
    response_id: Option<String>,
    model_version: Option<String>,
    tool_calls: Vec<PendingToolCall>,
    finish_reason: Option<FinishReason>,
    usage: Option<UsageMetadata>,
}

impl StreamAssembler {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            response_id: None,
            model_version: None,
            tool_calls: Vec::new(),
            finish_reason: None,
            usage: None,
        }
    }

    /// Consume one chunk, returning the delta it produces (if any).
    ///
    /// Only the first choice is followed; the adapter never asks for more.
    pub fn push(&mut self, chunk: ChatCompletionChunk) -> Option<StreamEvent> {
        if chunk.id.is_some() {
            self.response_id = chunk.id;
        }
        if chunk.model.is_some() {
            self.model_version = chunk.model;
        }
        if let Some(usage) = &chunk.usage {
            self.usage = Some(from_wire_usage(usage));
        }

        let choice = chunk.choices.into_iter().next()?;
        let mut parts = Vec::new();

        push_texts(&mut parts, choice.delta.reasoning_content.as_ref(), Part::thought);
        push_texts(&mut parts, choice.delta.content.as_ref(), Part::text);

        for fragment in choice.delta.tool_calls.unwrap_or_default() {
            self.absorb(fragment);
        }

        if let Some(reason) = choice.finish_reason.as_deref() {
            self.finish_reason = Some(map_finish_reason(Some(reason)));
            parts.extend(self.drain_tool_calls());
        }

        self.delta(parts)
    }

    /// Close the stream: flush leftover tool calls, then the terminal event.
    pub fn finish(mut self) -> Vec<StreamEvent> {
        let leftover = self.drain_tool_calls();
        let mut events: Vec<StreamEvent> = self.delta(leftover).into_iter().collect();

        events.push(StreamEvent::Finished {
            finish_reason: self.finish_reason.unwrap_or_default(),
            usage_metadata: self.usage,
            response_id: self.response_id,
            model_version: self.model_version,
        });
        events
    }

    fn absorb(&mut self, fragment: ToolCallDelta) {
        let id = fragment.id.filter(|id| !id.is_empty());
        let position = match id.as_deref() {
            // A fresh id always starts a new call, whatever its index.
            Some(id) => self.tool_calls.iter().position(|c| c.id == id),
            None => self.continuation_of(fragment.index),
        };
        let position = position.unwrap_or_else(|| {
            self.tool_calls.push(PendingToolCall::default());
            self.tool_calls.len() - 1
        });

        let call = &mut self.tool_calls[position];
        if let Some(id) = id {
            call.id = id;
        }
        if fragment.index.is_some() {
            call.index = fragment.index;
        }
        if let Some(function) = fragment.function {
            if let Some(name) = function.name.filter(|n| !n.is_empty()) {
                call.name = name;
            }
            if let Some(arguments) = function.arguments {
                call.arguments.push_str(&arguments);
            }
        }
        trace!(
            call = position,
            buffered = call.arguments.len(),
            "buffered tool call fragment"
        );
    }

    /// The call an id-less fragment continues: the latest call with the same
    /// index, else the latest call if it never announced an index.
    fn continuation_of(&self, index: Option<u32>) -> Option<usize> {
        let last = self.tool_calls.len().checked_sub(1);
        match index {
            Some(index) => self
                .tool_calls
                .iter()
                .rposition(|c| c.index == Some(index))
                .or_else(|| last.filter(|&i| self.tool_calls[i].index.is_none())),
            None => last,
        }
    }

    fn drain_tool_calls(&mut self) -> Vec<Part> {
        self.tool_calls
            .drain(..)
            .map(|call| tool_call_part(call.id, call.name, &call.arguments))
            .collect()
    }

    fn delta(&self, parts: Vec<Part>) -> Option<StreamEvent> {
        if parts.is_empty() {
            return None;
        }
        Some(StreamEvent::Delta(GenerationResponse {
            candidates: vec![Candidate::new(0, parts)],
            usage_metadata: None,
            response_id: self.response_id.clone(),
            model_version: self.model_version.clone(),
            request_id: Some(self.request_id.clone()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk(value: serde_json::Value) -> ChatCompletionChunk {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn arguments_split_across_chunks_are_joined() {
        let mut assembler = StreamAssembler::new("r1");
        let first = assembler.push(chunk(json!({
            "choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "c1", "function": {"name": "plan", "arguments": "{\"x\""}}
            ]}}]
        })));
        assert!(first.is_none());

        let second = assembler
            .push(chunk(json!({
                "choices": [{"delta": {"tool_calls": [
                    {"index": 0, "function": {"arguments": ":1}"}}
                ]}, "finish_reason": "tool_calls"}]
            })))
            .unwrap();
        assert_eq!(
            second.parts(),
            &[Part::function_call("c1", "plan", json!({"x": 1}))]
        );

        let events = assembler.finish();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            StreamEvent::Finished {
                finish_reason: FinishReason::Stop,
                ..
            }
        ));
    }

    #[test]
    fn interleaved_calls_keyed_by_index() {
        let mut assembler = StreamAssembler::new("r1");
        assembler.push(chunk(json!({"choices": [{"delta": {"tool_calls": [
            {"index": 0, "id": "a", "function": {"name": "one", "arguments": "{"}},
            {"index": 1, "id": "b", "function": {"name": "two", "arguments": "{\"k\":"}}
        ]}}]})));
        assembler.push(chunk(json!({"choices": [{"delta": {"tool_calls": [
            {"index": 1, "function": {"arguments": "2}"}},
            {"index": 0, "function": {"arguments": "}"}}
        ]}}]})));

        let events = assembler.finish();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].parts(),
            &[
                Part::function_call("a", "one", json!({})),
                Part::function_call("b", "two", json!({"k": 2})),
            ]
        );
        assert!(matches!(
            events[1],
            StreamEvent::Finished {
                finish_reason: FinishReason::Unspecified,
                ..
            }
        ));
    }

    #[test]
    fn reused_index_with_new_id_starts_a_new_call() {
        let mut assembler = StreamAssembler::new("r1");
        assembler.push(chunk(json!({"choices": [{"delta": {"tool_calls": [
            {"index": 0, "id": "call_a", "function": {"name": "read", "arguments": "{\"p\":1}"}}
        ]}}]})));
        let event = assembler
            .push(chunk(json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "call_b", "function": {"name": "write", "arguments": "{\"q\":2}"}}
            ]}, "finish_reason": "tool_calls"}]})))
            .unwrap();

        assert_eq!(
            event.parts(),
            &[
                Part::function_call("call_a", "read", json!({"p": 1})),
                Part::function_call("call_b", "write", json!({"q": 2})),
            ]
        );
    }

    #[test]
    fn index_only_fragment_continues_call_started_without_index() {
        let mut assembler = StreamAssembler::new("r1");
        assembler.push(chunk(json!({"choices": [{"delta": {"tool_calls": [
            {"id": "c1", "function": {"name": "plan", "arguments": "{\"x\""}}
        ]}}]})));
        assembler.push(chunk(json!({"choices": [{"delta": {"tool_calls": [
            {"index": 0, "function": {"arguments": ":1}"}}
        ]}}]})));

        let events = assembler.finish();
        assert_eq!(
            events[0].parts(),
            &[Part::function_call("c1", "plan", json!({"x": 1}))]
        );
    }

    #[test]
    fn id_less_calls_are_kept_apart_by_index() {
        let mut assembler = StreamAssembler::new("r1");
        assembler.push(chunk(json!({"choices": [{"delta": {"tool_calls": [
            {"index": 0, "function": {"name": "one", "arguments": "{}"}},
            {"index": 1, "function": {"name": "two", "arguments": "{}"}}
        ]}}]})));

        let events = assembler.finish();
        let names: Vec<_> = events[0]
            .parts()
            .iter()
            .filter_map(Part::as_function_call)
            .map(|call| call.name.as_str())
            .collect();
        assert_eq!(names, ["one", "two"]);
    }

    #[test]
    fn reasoning_precedes_text_within_a_chunk() {
        let mut assembler = StreamAssembler::new("r1");
        let event = assembler
            .push(chunk(json!({"id": "resp", "choices": [{"delta": {
                "content": "answer",
                "reasoning_content": "hmm"
            }}]})))
            .unwrap();
        assert_eq!(event.parts(), &[Part::thought("hmm"), Part::text("answer")]);
        let StreamEvent::Delta(response) = event else {
            panic!("expected delta");
        };
        assert_eq!(response.request_id.as_deref(), Some("r1"));
        assert_eq!(response.response_id.as_deref(), Some("resp"));
        assert!(response.usage_metadata.is_none());
    }

    #[test]
    fn usage_only_chunk_reaches_terminal_event() {
        let mut assembler = StreamAssembler::new("r1");
        assembler.push(chunk(json!({"choices": [{"delta": {}, "finish_reason": "length"}]})));
        assert!(
            assembler
                .push(chunk(json!({"choices": [], "usage": {
                    "prompt_tokens": 4, "completion_tokens": 6, "total_tokens": 10
                }})))
                .is_none()
        );

        let events = assembler.finish();
        let StreamEvent::Finished {
            finish_reason,
            usage_metadata,
            ..
        } = &events[0]
        else {
            panic!("expected finished");
        };
        assert_eq!(*finish_reason, FinishReason::MaxTokens);
        assert_eq!(usage_metadata.unwrap().total_token_count, 10);
    }
}
