//! Bifrost - Gemini-contract adapter for GLM chat-completions endpoints
//!
//! This crate lets a host built against the Gemini `generateContent`
//! contract talk to a GLM (Zhipu) OpenAI-style chat-completions endpoint.
//! Requests and responses are translated in both directions, including
//! reasoning ("thinking") content, function calling, token accounting and
//! streaming. The host only sees [`ContentGenerator`].
//!
//! # Example
//!
//! ```rust,no_run
//! use bifrost::{Bifrost, Content, ContentGenerator, GenerationRequest};
//!
//! #[tokio::main]
//! async fn main() -> bifrost::Result<()> {
//!     let generator = Bifrost::builder()
//!         .api_key("your-glm-key")
//!         .model("glm-4.6")
//!         .build()?;
//!
//!     let request = GenerationRequest::new("glm-4.6", vec![Content::user("Hello!")]);
//!     let response = generator.generate(&request, "req-1").await?;
//!
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```
//!
//! # Streaming
//!
//! ```rust,no_run
//! use bifrost::{Bifrost, Content, ContentGenerator, GenerationRequest, StreamEvent};
//! use futures_util::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> bifrost::Result<()> {
//!     let generator = Bifrost::builder().api_key("your-glm-key").build()?;
//!     let request = GenerationRequest::new("glm-4.6", vec![Content::user("Count to 3")]);
//!
//!     let mut stream = generator.generate_stream(&request, "req-2").await?;
//!     while let Some(event) = stream.next().await {
//!         match event? {
//!             StreamEvent::Delta(delta) => print!("{}", delta.text()),
//!             StreamEvent::Finished { finish_reason, .. } => println!("\n[{finish_reason:?}]"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod generator;
pub mod stream;
pub mod telemetry;
pub mod thinking;
pub mod traits;
pub mod types;
pub mod version;
pub mod wire;

// Re-export main types at crate root
pub use config::Settings;
pub use error::{BifrostError, ParseError, Result};
pub use generator::{
    AdapterConfig, AuthMode, Bifrost, GlmContentGenerator, SearchRoute, route_web_search,
};
pub use stream::EventStream;
pub use thinking::{ThinkingPolicy, ThinkingState};
pub use traits::ContentGenerator;
pub use version::PKG_VERSION;

// Re-export all host types
pub use types::{
    Candidate, Content, FinishReason, FunctionCall, FunctionCallingConfig, FunctionCallingMode,
    FunctionDeclaration, FunctionResponse, GenerationConfig, GenerationRequest, GenerationResponse,
    HttpOptions, Part, Role, StreamEvent, ThinkingConfig, Tool, ToolConfig, UsageMetadata,
};
