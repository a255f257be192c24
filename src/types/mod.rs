//! Host-facing types: the generation request/response contract.

mod content;
mod request;
mod response;
mod tool;

pub use content::{Content, FunctionCall, FunctionResponse, Part, Role};
pub use request::{GenerationConfig, GenerationRequest, HttpOptions, ThinkingConfig};
pub use response::{Candidate, FinishReason, GenerationResponse, StreamEvent, UsageMetadata};
pub use tool::{FunctionCallingConfig, FunctionCallingMode, FunctionDeclaration, Tool, ToolConfig};
