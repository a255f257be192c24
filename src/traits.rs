//! Core ContentGenerator trait

use async_trait::async_trait;

use crate::stream::EventStream;
use crate::{BifrostError, GenerationRequest, GenerationResponse, Result};

/// The host's content-generation contract.
///
/// Implementations are stateless between calls and safe to share across
/// tasks; concurrent calls never observe each other.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Non-streaming generation
    async fn generate(
        &self,
        request: &GenerationRequest,
        request_id: &str,
    ) -> Result<GenerationResponse>;

    /// Streaming generation.
    ///
    /// Errors establishing the stream are returned here; errors after that
    /// arrive as the stream's final item.
    async fn generate_stream(
        &self,
        request: &GenerationRequest,
        request_id: &str,
    ) -> Result<EventStream>;

    /// Token counting (the host falls back to its own estimate)
    async fn count_tokens(&self, _request: &GenerationRequest) -> Result<u32> {
        Err(BifrostError::NotImplemented("count_tokens"))
    }
}
